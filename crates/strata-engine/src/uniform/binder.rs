use crate::time::FrameIndexSource;

use super::{Reservation, UniformPool, UniformRegion};

/// Programmable pipeline stage owning a default uniform buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 2] = [ShaderStage::Vertex, ShaderStage::Fragment];

    pub fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// Compiled program for one stage, as seen by the binder.
pub trait ProgramDescriptor {
    /// Bytes of default uniform data the program reads. Zero means none.
    ///
    /// Must be a pure query.
    fn default_uniform_buffer_size(&self) -> u32;
}

/// GPU context collaborator that attaches a stage's default uniform buffer.
///
/// Binding the same reservation twice must be harmless.
pub trait UniformBindTarget {
    fn bind_default_uniform_buffer(&mut self, stage: ShaderStage, reservation: Reservation);
}

/// Per-stage binder: reserves uniform memory for a program and binds it.
///
/// The binder remembers the last reservation so it can be re-bound after the GPU
/// context loses its bindings.
#[derive(Debug, Clone)]
pub struct StageUniformBinder {
    stage: ShaderStage,
    slot: Option<Reservation>,
}

impl StageUniformBinder {
    pub const fn new(stage: ShaderStage) -> Self {
        Self { stage, slot: None }
    }

    /// Last reservation bound for this stage, if any.
    #[inline]
    pub fn current(&self) -> Option<Reservation> {
        self.slot
    }

    /// Reserves and binds the uniform buffer `program` needs.
    ///
    /// Returns `None` for programs without default uniforms; nothing is reserved or
    /// bound in that case and the remembered reservation is kept. Otherwise the caller
    /// must fill the returned reservation before the draw is submitted.
    pub fn query_and_bind<P, R, F, T>(
        &mut self,
        program: &P,
        pool: &mut UniformPool<R, F>,
        target: &mut T,
    ) -> Option<Reservation>
    where
        P: ProgramDescriptor + ?Sized,
        R: UniformRegion,
        F: FrameIndexSource,
        T: UniformBindTarget + ?Sized,
    {
        let size = program.default_uniform_buffer_size();
        if size == 0 {
            return None;
        }

        let reservation = pool.reserve(size);
        self.slot = Some(reservation);
        target.bind_default_uniform_buffer(self.stage, reservation);
        Some(reservation)
    }

    /// Re-binds the remembered reservation without reserving again.
    ///
    /// Returns false (and binds nothing) if this stage never reserved.
    pub fn restore<T>(&self, target: &mut T) -> bool
    where
        T: UniformBindTarget + ?Sized,
    {
        let Some(reservation) = self.slot else {
            return false;
        };
        target.bind_default_uniform_buffer(self.stage, reservation);
        true
    }
}

/// Vertex + fragment binders.
#[derive(Debug, Clone)]
pub struct StageBinders {
    pub vertex: StageUniformBinder,
    pub fragment: StageUniformBinder,
}

impl StageBinders {
    pub const fn new() -> Self {
        Self {
            vertex: StageUniformBinder::new(ShaderStage::Vertex),
            fragment: StageUniformBinder::new(ShaderStage::Fragment),
        }
    }

    pub fn get(&self, stage: ShaderStage) -> &StageUniformBinder {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    /// Re-binds every stage that has a remembered reservation.
    pub fn restore_all<T>(&self, target: &mut T)
    where
        T: UniformBindTarget + ?Sized,
    {
        for stage in ShaderStage::ALL {
            self.get(stage).restore(target);
        }
    }
}

impl Default for StageBinders {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FrameCounter;
    use crate::uniform::{HostAllocator, HostRegion, PoolConfig};

    struct Program(u32);

    impl ProgramDescriptor for Program {
        fn default_uniform_buffer_size(&self) -> u32 {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingContext {
        binds: Vec<(ShaderStage, Reservation)>,
    }

    impl UniformBindTarget for RecordingContext {
        fn bind_default_uniform_buffer(&mut self, stage: ShaderStage, reservation: Reservation) {
            self.binds.push((stage, reservation));
        }
    }

    fn pool() -> UniformPool<HostRegion> {
        let config = PoolConfig {
            capacity: 256,
            ..Default::default()
        };
        UniformPool::setup(&HostAllocator::new(), config, FrameCounter::new()).unwrap()
    }

    // ── query_and_bind ────────────────────────────────────────────────────

    #[test]
    fn binds_fresh_reservation() {
        let mut pool = pool();
        let mut ctx = RecordingContext::default();
        let mut binder = StageUniformBinder::new(ShaderStage::Vertex);

        let r = binder.query_and_bind(&Program(64), &mut pool, &mut ctx).unwrap();
        assert_eq!(r.size(), 64);
        assert_eq!(r.offset(), 0);
        assert_eq!(binder.current(), Some(r));
        assert_eq!(ctx.binds, vec![(ShaderStage::Vertex, r)]);
        assert_eq!(pool.cursor(), 64);
    }

    #[test]
    fn each_bind_replaces_remembered_reservation() {
        let mut pool = pool();
        let mut ctx = RecordingContext::default();
        let mut binder = StageUniformBinder::new(ShaderStage::Fragment);

        let first = binder.query_and_bind(&Program(32), &mut pool, &mut ctx).unwrap();
        let second = binder.query_and_bind(&Program(16), &mut pool, &mut ctx).unwrap();
        assert_eq!(second.offset(), first.end());
        assert_eq!(binder.current(), Some(second));
        assert_eq!(ctx.binds.len(), 2);
    }

    #[test]
    fn zero_size_program_is_a_no_op() {
        let mut pool = pool();
        let mut ctx = RecordingContext::default();
        let mut binder = StageUniformBinder::new(ShaderStage::Vertex);

        let bound = binder.query_and_bind(&Program(48), &mut pool, &mut ctx);
        let cursor = pool.cursor();
        let reservations = pool.stats().reservations;

        assert_eq!(binder.query_and_bind(&Program(0), &mut pool, &mut ctx), None);
        assert_eq!(binder.current(), bound);
        assert_eq!(pool.cursor(), cursor);
        assert_eq!(pool.stats().reservations, reservations);
        assert_eq!(ctx.binds.len(), 1);
    }

    #[test]
    fn zero_size_program_leaves_unset_stage_unset() {
        let mut pool = pool();
        let mut ctx = RecordingContext::default();
        let mut binder = StageUniformBinder::new(ShaderStage::Vertex);

        assert_eq!(binder.query_and_bind(&Program(0), &mut pool, &mut ctx), None);
        assert_eq!(binder.current(), None);
        assert_eq!(pool.stats().reservations, 0);
        assert!(ctx.binds.is_empty());
    }

    // ── restore ───────────────────────────────────────────────────────────

    #[test]
    fn restore_before_any_bind_does_nothing() {
        let mut ctx = RecordingContext::default();
        let binder = StageUniformBinder::new(ShaderStage::Fragment);
        assert!(!binder.restore(&mut ctx));
        assert!(ctx.binds.is_empty());
    }

    #[test]
    fn restore_rebinds_without_reserving() {
        let mut pool = pool();
        let mut ctx = RecordingContext::default();
        let mut binder = StageUniformBinder::new(ShaderStage::Fragment);
        let r = binder.query_and_bind(&Program(16), &mut pool, &mut ctx).unwrap();

        let cursor = pool.cursor();
        assert!(binder.restore(&mut ctx));
        assert!(binder.restore(&mut ctx));
        assert_eq!(pool.cursor(), cursor);
        assert_eq!(
            ctx.binds,
            vec![
                (ShaderStage::Fragment, r),
                (ShaderStage::Fragment, r),
                (ShaderStage::Fragment, r),
            ]
        );
    }

    // ── pair ──────────────────────────────────────────────────────────────

    #[test]
    fn stages_share_one_pool() {
        let mut pool = pool();
        let mut ctx = RecordingContext::default();
        let mut binders = StageBinders::new();

        let v = binders
            .vertex
            .query_and_bind(&Program(64), &mut pool, &mut ctx)
            .unwrap();
        let f = binders
            .fragment
            .query_and_bind(&Program(16), &mut pool, &mut ctx)
            .unwrap();
        assert_eq!(f.offset(), v.end());
    }

    #[test]
    fn restore_all_skips_unset_stages() {
        let mut pool = pool();
        let mut ctx = RecordingContext::default();
        let mut binders = StageBinders::new();
        let f = binders
            .fragment
            .query_and_bind(&Program(16), &mut pool, &mut ctx)
            .unwrap();
        ctx.binds.clear();

        binders.restore_all(&mut ctx);
        assert_eq!(ctx.binds, vec![(ShaderStage::Fragment, f)]);
    }
}
