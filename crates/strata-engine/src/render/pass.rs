use crate::uniform::{Reservation, ShaderStage, UniformBindTarget};

use super::StageBindGroups;

/// GPU context for stage binders inside a wgpu render pass.
///
/// Binding a reservation sets the stage's bind group with the reservation offset as
/// its dynamic offset.
pub struct PassBinder<'a, 'p> {
    pass: &'a mut wgpu::RenderPass<'p>,
    groups: &'a StageBindGroups,
}

impl<'a, 'p> PassBinder<'a, 'p> {
    pub fn new(pass: &'a mut wgpu::RenderPass<'p>, groups: &'a StageBindGroups) -> Self {
        Self { pass, groups }
    }

    /// The wrapped pass, for pipeline changes and draws.
    #[inline]
    pub fn pass(&mut self) -> &mut wgpu::RenderPass<'p> {
        &mut *self.pass
    }
}

impl UniformBindTarget for PassBinder<'_, '_> {
    fn bind_default_uniform_buffer(&mut self, stage: ShaderStage, reservation: Reservation) {
        let Some(group) = self.groups.get(stage) else {
            log::debug!("no {} uniform group in this program; bind skipped", stage.label());
            return;
        };
        let Ok(offset) = u32::try_from(reservation.offset()) else {
            log::warn!(
                "{} uniform offset {} exceeds the dynamic offset range",
                stage.label(),
                reservation.offset()
            );
            return;
        };

        self.pass.set_bind_group(group.index, &group.group, &[offset]);
    }
}
