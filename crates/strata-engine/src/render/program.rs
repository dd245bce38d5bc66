use anyhow::{Context, Result};

use crate::uniform::{ProgramDescriptor, ShaderStage};

use super::RenderCtx;

/// Default-uniform requirements of one shader stage.
///
/// `block_size` is the size of the WGSL uniform struct. The size reported to the
/// binder is padded to the device's dynamic-offset alignment, which keeps every
/// reservation offset in the pool aligned without the pool knowing about it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLayout {
    stage: ShaderStage,
    block_size: u32,
    binding_size: u32,
}

impl UniformLayout {
    /// Returns `None` if padding `block_size` overflows `u32`.
    pub fn new(stage: ShaderStage, block_size: u32, offset_alignment: u32) -> Option<Self> {
        let binding_size = if block_size == 0 {
            0
        } else {
            block_size.checked_next_multiple_of(offset_alignment.max(1))?
        };
        Some(Self {
            stage,
            block_size,
            binding_size,
        })
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    #[inline]
    pub fn binding_size(&self) -> u32 {
        self.binding_size
    }
}

impl ProgramDescriptor for UniformLayout {
    fn default_uniform_buffer_size(&self) -> u32 {
        self.binding_size
    }
}

pub(crate) fn visibility(stage: ShaderStage) -> wgpu::ShaderStages {
    match stage {
        ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
        ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
    }
}

/// Bind group over the uniform pool buffer for one stage.
#[derive(Debug)]
pub struct StageGroup {
    pub index: u32,
    pub layout: wgpu::BindGroupLayout,
    pub group: wgpu::BindGroup,
}

/// Per-stage dynamic-offset bind groups over the pool buffer.
///
/// Group indices are assigned in stage order (vertex, fragment) to the stages that
/// have uniforms, so a fragment-only program uses group 0.
#[derive(Debug)]
pub struct StageBindGroups {
    vertex: Option<StageGroup>,
    fragment: Option<StageGroup>,
}

impl StageBindGroups {
    pub fn new(
        device: &wgpu::Device,
        pool_buffer: &wgpu::Buffer,
        vertex: &UniformLayout,
        fragment: &UniformLayout,
    ) -> Self {
        let mut next_index = 0u32;
        let mut build = |layout: &UniformLayout| {
            let group = stage_group(device, pool_buffer, layout, next_index)?;
            next_index += 1;
            Some(group)
        };

        let vertex = build(vertex);
        let fragment = build(fragment);
        Self { vertex, fragment }
    }

    pub fn get(&self, stage: ShaderStage) -> Option<&StageGroup> {
        match stage {
            ShaderStage::Vertex => self.vertex.as_ref(),
            ShaderStage::Fragment => self.fragment.as_ref(),
        }
    }

    /// Layouts in group-index order.
    pub fn layouts(&self) -> Vec<&wgpu::BindGroupLayout> {
        [&self.vertex, &self.fragment]
            .into_iter()
            .flatten()
            .map(|g| &g.layout)
            .collect()
    }
}

fn stage_group(
    device: &wgpu::Device,
    pool_buffer: &wgpu::Buffer,
    layout: &UniformLayout,
    index: u32,
) -> Option<StageGroup> {
    let min_binding_size = wgpu::BufferSize::new(u64::from(layout.block_size()))?;
    let binding_size = wgpu::BufferSize::new(u64::from(layout.binding_size()))?;
    let stage = layout.stage().label();

    let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("strata {stage} uniform bgl")),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: visibility(layout.stage()),
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: Some(min_binding_size),
            },
            count: None,
        }],
    });

    let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("strata {stage} uniform bind group")),
        layout: &bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: pool_buffer,
                offset: 0,
                size: Some(binding_size),
            }),
        }],
    });

    Some(StageGroup {
        index,
        layout: bgl,
        group,
    })
}

/// Source and uniform requirements of a vertex + fragment program.
#[derive(Debug, Clone)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub wgsl: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    /// Size of the vertex stage's uniform struct; 0 if it has none.
    pub vertex_uniform_size: u32,
    /// Size of the fragment stage's uniform struct; 0 if it has none.
    pub fragment_uniform_size: u32,
}

/// Compiled render pipeline whose stage uniforms come from the uniform pool.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    vertex: UniformLayout,
    fragment: UniformLayout,
    bindings: StageBindGroups,
}

impl ShaderProgram {
    /// Compiles `desc` against the pool buffer.
    ///
    /// Geometry comes from `@builtin(vertex_index)`; no vertex buffers are bound.
    pub fn new(
        ctx: &RenderCtx<'_>,
        pool_buffer: &wgpu::Buffer,
        desc: &ProgramDesc<'_>,
    ) -> Result<Self> {
        let align = ctx.uniform_offset_alignment();
        let layout = |stage: ShaderStage, size: u32| {
            UniformLayout::new(stage, size, align).with_context(|| {
                format!(
                    "{}: {} uniform block of {size} bytes cannot be padded to {align}",
                    desc.label,
                    stage.label()
                )
            })
        };
        let vertex = layout(ShaderStage::Vertex, desc.vertex_uniform_size)?;
        let fragment = layout(ShaderStage::Fragment, desc.fragment_uniform_size)?;
        let bindings = StageBindGroups::new(ctx.device, pool_buffer, &vertex, &fragment);

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.wgsl.into()),
        });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &bindings.layouts(),
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(desc.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(desc.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "compiled program {}: vertex uniforms {} B, fragment uniforms {} B",
            desc.label,
            vertex.binding_size(),
            fragment.binding_size()
        );

        Ok(Self {
            pipeline,
            vertex,
            fragment,
            bindings,
        })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Uniform requirements of `stage`; pass this to the stage's binder.
    pub fn uniforms(&self, stage: ShaderStage) -> &UniformLayout {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    pub fn bindings(&self) -> &StageBindGroups {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(stage: ShaderStage, block_size: u32, align: u32) -> UniformLayout {
        UniformLayout::new(stage, block_size, align).unwrap()
    }

    #[test]
    fn binding_size_is_padded_to_alignment() {
        let l = layout(ShaderStage::Vertex, 64, 256);
        assert_eq!(l.block_size(), 64);
        assert_eq!(l.default_uniform_buffer_size(), 256);

        let l = layout(ShaderStage::Fragment, 300, 256);
        assert_eq!(l.default_uniform_buffer_size(), 512);
    }

    #[test]
    fn exact_multiple_is_not_padded() {
        let l = layout(ShaderStage::Vertex, 512, 256);
        assert_eq!(l.default_uniform_buffer_size(), 512);
    }

    #[test]
    fn stage_without_uniforms_reports_zero() {
        assert_eq!(layout(ShaderStage::Fragment, 0, 256).default_uniform_buffer_size(), 0);
        assert_eq!(layout(ShaderStage::Vertex, 0, 256).binding_size(), 0);
    }

    #[test]
    fn zero_alignment_is_treated_as_one() {
        let l = layout(ShaderStage::Vertex, 20, 0);
        assert_eq!(l.binding_size(), 20);
    }

    #[test]
    fn padding_past_u32_is_rejected() {
        assert_eq!(UniformLayout::new(ShaderStage::Vertex, u32::MAX - 10, 256), None);
        assert_eq!(UniformLayout::new(ShaderStage::Fragment, u32::MAX, 2), None);

        let largest = u32::MAX - 255;
        let l = layout(ShaderStage::Vertex, largest, 256);
        assert_eq!(l.binding_size(), largest);
    }
}
