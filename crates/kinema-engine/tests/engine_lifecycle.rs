//! Integration test: engine scheduling and motivator lifecycle.
//!
//! Registers custom processors next to the built-in linear one and checks
//! priority ordering, lazy creation, handle transfer, and that motivator
//! handles keep resolving to their own data across defragmentation under
//! both defragment policies.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

use kinema_core::{HandleId, MotiveTime, MotivatorType, SlotIndex};
use kinema_engine::{
    DefragmentPolicy, EngineConfig, EngineError, LinearInit, LinearProcessor, MotiveEngine,
    MotiveTarget1f, Motivator, Processor, ProcessorRegistry, SlotAccess,
};
use kinema_pool::SlotPool;
use kinema_test_utils::{RecordingStore, TaggedInit};
use proptest::prelude::*;

// ── Stamp processor: records when it was advanced ────────────────────

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Records a global sequence number each time it advances, so tests can
/// compare the order in which processors ran.
struct StampProcessor {
    type_tag: MotivatorType,
    priority: i32,
    pool: SlotPool<RecordingStore>,
    last_stamp: u64,
}

impl StampProcessor {
    const EARLY: MotivatorType = MotivatorType("stamp-early");
    const LATE: MotivatorType = MotivatorType("stamp-late");

    fn build(
        type_tag: MotivatorType,
        priority: i32,
        config: &EngineConfig,
    ) -> Result<Box<dyn Processor>, EngineError> {
        Ok(Box::new(Self {
            type_tag,
            priority,
            pool: SlotPool::with_config(RecordingStore::new(), &config.pool)?,
            last_stamp: 0,
        }))
    }

    fn early(config: &EngineConfig) -> Result<Box<dyn Processor>, EngineError> {
        Self::build(Self::EARLY, -10, config)
    }

    fn late(config: &EngineConfig) -> Result<Box<dyn Processor>, EngineError> {
        Self::build(Self::LATE, 10, config)
    }
}

impl Processor for StampProcessor {
    fn type_tag(&self) -> MotivatorType {
        self.type_tag
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn initialize_motivator(
        &mut self,
        init: &dyn Any,
        handle: HandleId,
    ) -> Result<SlotIndex, EngineError> {
        let type_tag = self.type_tag;
        let init = init
            .downcast_ref::<TaggedInit>()
            .ok_or(EngineError::InitMismatch { type_tag })?;
        self.pool
            .initialize(init, handle)
            .map_err(|source| EngineError::Pool { type_tag, source })
    }

    fn advance_frame(&mut self, _delta_time: MotiveTime) {
        self.last_stamp = SEQUENCE.fetch_add(1, Ordering::SeqCst);
    }

    fn slots(&self) -> &dyn SlotAccess {
        &self.pool
    }

    fn slots_mut(&mut self) -> &mut dyn SlotAccess {
        &mut self.pool
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::with_builtin();
    registry
        .register(StampProcessor::LATE, StampProcessor::late)
        .unwrap();
    registry
        .register(StampProcessor::EARLY, StampProcessor::early)
        .unwrap();
    registry
}

fn stamp(engine: &MotiveEngine, type_tag: MotivatorType) -> u64 {
    engine
        .processor_as::<StampProcessor>(type_tag)
        .unwrap()
        .last_stamp
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn processors_advance_in_priority_order() {
    let mut engine = MotiveEngine::new(registry(), EngineConfig::default()).unwrap();
    // Create in reverse priority order.
    engine
        .initialize_motivator(StampProcessor::LATE, &TaggedInit::new(1, 1), HandleId::next())
        .unwrap();
    engine
        .initialize_motivator(LinearProcessor::TYPE, &LinearInit::scalar(0.0), HandleId::next())
        .unwrap();
    engine
        .initialize_motivator(StampProcessor::EARLY, &TaggedInit::new(2, 1), HandleId::next())
        .unwrap();

    assert_eq!(
        engine.update_order(),
        &[
            StampProcessor::EARLY,
            LinearProcessor::TYPE,
            StampProcessor::LATE
        ]
    );

    let report = engine.advance_frame(0.016).unwrap();
    assert_eq!(report.processors, 3);
    assert!(stamp(&engine, StampProcessor::EARLY) < stamp(&engine, StampProcessor::LATE));
}

#[test]
fn unused_types_are_never_created() {
    let mut engine = MotiveEngine::new(registry(), EngineConfig::default()).unwrap();
    let mut m = Motivator::new();
    m.initialize(&mut engine, LinearProcessor::TYPE, &LinearInit::scalar(1.0))
        .unwrap();
    assert!(engine.processor(StampProcessor::EARLY).is_none());
    assert!(engine.processor(StampProcessor::LATE).is_none());
    assert_eq!(engine.advance_frame(0.1).unwrap().processors, 1);
}

#[test]
fn init_of_wrong_type_is_rejected() {
    let mut engine = MotiveEngine::new(registry(), EngineConfig::default()).unwrap();
    let mut m = Motivator::new();
    assert_eq!(
        m.initialize(&mut engine, StampProcessor::EARLY, &LinearInit::scalar(1.0)),
        Err(EngineError::InitMismatch {
            type_tag: StampProcessor::EARLY
        })
    );
    assert!(!m.is_valid(&engine));
}

#[test]
fn handles_follow_data_through_frames() {
    let mut engine = MotiveEngine::with_builtin();
    let mut motivators: Vec<(Motivator, f32)> = (0..8)
        .map(|i| {
            let mut m = Motivator::new();
            let start = i as f32;
            m.initialize(&mut engine, LinearProcessor::TYPE, &LinearInit::scalar(start))
                .unwrap();
            (m, start)
        })
        .collect();

    // Drop every other motivator, leaving holes.
    for (m, _) in motivators.iter_mut().step_by(2) {
        assert!(m.invalidate(&mut engine));
    }
    motivators.retain(|(m, _)| m.is_valid(&engine));

    let report = engine.advance_frame(0.0).unwrap();
    assert_eq!(report.relocations, 4);
    for (slot, (m, start)) in motivators.iter().enumerate() {
        assert_eq!(m.index(&engine), SlotIndex(slot as u32));
        assert_eq!(m.value(&engine), Some(*start));
    }
    engine.verify_internal_state().unwrap();
}

#[test]
fn manual_policy_defers_compaction() {
    let config = EngineConfig {
        defragment_policy: DefragmentPolicy::Manual,
        verify_each_frame: true,
        ..EngineConfig::default()
    };
    let mut engine = MotiveEngine::new(ProcessorRegistry::with_builtin(), config).unwrap();
    let mut a = Motivator::new();
    let mut b = Motivator::new();
    a.initialize(&mut engine, LinearProcessor::TYPE, &LinearInit::scalar(1.0))
        .unwrap();
    b.initialize(
        &mut engine,
        LinearProcessor::TYPE,
        &LinearInit::new(vec![2.0, 3.0]),
    )
    .unwrap();
    a.invalidate(&mut engine);

    assert_eq!(engine.advance_frame(0.1).unwrap().relocations, 0);
    assert_eq!(b.index(&engine), SlotIndex(1));

    assert_eq!(engine.defragment_all(), 1);
    assert_eq!(b.index(&engine), SlotIndex(0));
    assert_eq!(b.child_value(&engine, 1), Some(3.0));
}

#[test]
fn taken_motivator_animates_under_new_owner() {
    let mut engine = MotiveEngine::with_builtin();
    let mut filler = Motivator::new();
    let mut original = Motivator::new();
    filler
        .initialize(&mut engine, LinearProcessor::TYPE, &LinearInit::scalar(0.0))
        .unwrap();
    original
        .initialize(&mut engine, LinearProcessor::TYPE, &LinearInit::scalar(0.0))
        .unwrap();
    original
        .set_target(&mut engine, MotiveTarget1f::new(4.0, 2.0))
        .unwrap();

    let moved = original.take(&mut engine).unwrap();
    filler.invalidate(&mut engine);
    engine.advance_frame(1.0).unwrap();

    assert!(!original.is_valid(&engine));
    assert_eq!(moved.index(&engine), SlotIndex(0));
    assert_eq!(moved.value(&engine), Some(2.0));
    assert_eq!(moved.child_velocity(&engine, 0), Some(2.0));
}

#[test]
fn clear_unbinds_every_handle() {
    let mut engine = MotiveEngine::new(registry(), EngineConfig::default()).unwrap();
    let mut a = Motivator::new();
    let mut b = Motivator::new();
    a.initialize(&mut engine, LinearProcessor::TYPE, &LinearInit::scalar(1.0))
        .unwrap();
    b.initialize(&mut engine, StampProcessor::EARLY, &TaggedInit::new(9, 3))
        .unwrap();

    assert_eq!(engine.clear(), 2);
    assert_eq!(engine.live_count(), 0);
    assert!(!a.is_valid(&engine));
    assert!(!b.is_valid(&engine));
    // The stale handle has nothing left to release.
    assert!(!a.invalidate(&mut engine));
}

#[test]
fn scalar_queries_need_scalar_processor() {
    let mut engine = MotiveEngine::new(registry(), EngineConfig::default()).unwrap();
    let mut m = Motivator::new();
    m.initialize(&mut engine, StampProcessor::LATE, &TaggedInit::new(1, 2))
        .unwrap();
    assert_eq!(m.value(&engine), None);
    assert_eq!(
        m.set_target(&mut engine, MotiveTarget1f::new(1.0, 1.0)),
        Err(EngineError::NotScalar {
            type_tag: StampProcessor::LATE
        })
    );
}

// ── Property: churn through the engine keeps every handle resolvable ──

proptest! {
    #[test]
    fn churn_keeps_values_attached(
        widths in proptest::collection::vec(1u16..5, 1..40),
        removals in proptest::collection::vec(any::<usize>(), 0..20),
    ) {
        let mut engine = MotiveEngine::with_builtin();
        let mut live: Vec<(Motivator, Vec<f32>)> = Vec::new();
        for (i, &width) in widths.iter().enumerate() {
            let values: Vec<f32> = (0..width).map(|c| (i * 10) as f32 + f32::from(c)).collect();
            let mut m = Motivator::new();
            m.initialize(&mut engine, LinearProcessor::TYPE, &LinearInit::new(values.clone()))
                .unwrap();
            live.push((m, values));
        }
        for pick in removals {
            if live.is_empty() {
                break;
            }
            let (mut m, _) = live.remove(pick % live.len());
            prop_assert!(m.invalidate(&mut engine));
        }

        engine.advance_frame(0.5).unwrap();
        engine.verify_internal_state().unwrap();

        let mut cursor = 0u32;
        for (m, values) in &live {
            prop_assert_eq!(m.index(&engine), SlotIndex(cursor));
            for (c, &v) in values.iter().enumerate() {
                prop_assert_eq!(m.child_value(&engine, c as u16), Some(v));
            }
            cursor += values.len() as u32;
        }
        prop_assert_eq!(engine.live_count(), live.len());
    }
}
