//! Headless demo: records a grid of spinning triangles per frame, each draw taking
//! its vertex and fragment uniforms from the circular pool.

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};

use strata_engine::device::{GpuInit, HeadlessGpu, WgpuAllocator, WgpuRegion};
use strata_engine::logging::{LoggingConfig, init_logging};
use strata_engine::math::{Mat4, Vec3};
use strata_engine::render::{PassBinder, ProgramDesc, RenderCtx, RenderTarget, ShaderProgram};
use strata_engine::time::{FrameClock, FrameCounter};
use strata_engine::uniform::{PoolConfig, PoolError, ShaderStage, StageBinders, UniformPool};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const TARGET_SIZE: u32 = 512;

const FRAMES: u32 = 240;
const GRID: u32 = 8;
const DRAWS_PER_FRAME: u32 = GRID * 5;

type Pool = UniformPool<WgpuRegion, FrameCounter>;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct VertexUniforms {
    mvp: Mat4,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FragmentUniforms {
    color: [f32; 4],
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let gpu = HeadlessGpu::new_blocking(GpuInit::default())?;
    let ctx = RenderCtx::new(gpu.device(), gpu.queue(), TARGET_FORMAT);

    let mut clock = FrameClock::new();
    let mut pool: Pool = UniformPool::setup(
        &WgpuAllocator::new(gpu.device()),
        PoolConfig::default(),
        clock.counter(),
    )
    .context("uniform pool setup failed")?;

    let program = ShaderProgram::new(
        &ctx,
        pool.region().buffer(),
        &ProgramDesc {
            label: "strata triangle program",
            wgsl: include_str!("shaders/triangle.wgsl"),
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            vertex_uniform_size: size_of::<VertexUniforms>() as u32,
            fragment_uniform_size: size_of::<FragmentUniforms>() as u32,
        },
    )?;

    let texture = offscreen_texture(&ctx);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let projection = Mat4::perspective(60.0, 1.0, 0.1, 100.0);
    let mut binders = StageBinders::new();
    let mut elapsed = 0.0f32;

    for _ in 0..FRAMES {
        let ft = clock.tick();
        elapsed += ft.dt;

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata frame encoder"),
            });

        {
            let mut target = RenderTarget::new(&mut encoder, &view);

            {
                let mut pass =
                    target.begin_pass("strata scene pass", wgpu::LoadOp::Clear(wgpu::Color::BLACK));
                pass.set_pipeline(program.pipeline());
                let mut binder = PassBinder::new(&mut pass, program.bindings());

                for i in 0..DRAWS_PER_FRAME {
                    let (vertex, fragment) = triangle_uniforms(i, elapsed, projection);
                    draw(&mut binders, &program, &mut pool, &mut binder, &vertex, &fragment)
                        .with_context(|| format!("frame {}: draw {i} failed", ft.frame_index))?;
                }
            }

            {
                // The new pass has no bind groups; redraw the last triangle on top with
                // the uniforms it already reserved.
                let mut pass = target.begin_pass("strata overlay pass", wgpu::LoadOp::Load);
                pass.set_pipeline(program.pipeline());
                let mut binder = PassBinder::new(&mut pass, program.bindings());
                binders.restore_all(&mut binder);
                binder.pass().draw(0..3, 0..1);
            }
        }

        pool.region_mut().flush(ctx.queue);
        ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    let stats = pool.stats();
    log::info!(
        "rendered {FRAMES} frames: {} reservations, {} wraps, {} outage warnings, cursor at {} of {} bytes",
        stats.reservations,
        stats.wraps,
        stats.outage_reports,
        pool.cursor(),
        pool.capacity()
    );

    Ok(())
}

/// Reserves, binds and fills both stages' uniforms, then draws one triangle.
fn draw(
    binders: &mut StageBinders,
    program: &ShaderProgram,
    pool: &mut Pool,
    binder: &mut PassBinder<'_, '_>,
    vertex: &VertexUniforms,
    fragment: &FragmentUniforms,
) -> Result<(), PoolError> {
    let vertex_program = program.uniforms(ShaderStage::Vertex);
    if let Some(r) = binders.vertex.query_and_bind(vertex_program, pool, binder) {
        pool.write_pod(r, vertex)?;
    }

    let fragment_program = program.uniforms(ShaderStage::Fragment);
    if let Some(r) = binders.fragment.query_and_bind(fragment_program, pool, binder) {
        pool.write_pod(r, fragment)?;
    }

    binder.pass().draw(0..3, 0..1);
    Ok(())
}

fn triangle_uniforms(i: u32, elapsed: f32, projection: Mat4) -> (VertexUniforms, FragmentUniforms) {
    let col = (i % GRID) as f32;
    let row = (i / GRID) as f32;
    let t = i as f32 / DRAWS_PER_FRAME as f32;

    let model = Mat4::from_scale(0.35, 0.35, 0.35)
        .rotate(elapsed * (1.0 + t), Vec3::Z)
        .translate(col * 0.5 - 1.75, row * 0.5 - 1.0, -3.0);

    (
        VertexUniforms {
            mvp: model * projection,
        },
        FragmentUniforms {
            color: [t, 0.4, 1.0 - t, 1.0],
        },
    )
}

fn offscreen_texture(ctx: &RenderCtx<'_>) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("strata offscreen target"),
        size: wgpu::Extent3d {
            width: TARGET_SIZE,
            height: TARGET_SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}
