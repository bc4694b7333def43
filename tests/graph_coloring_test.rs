use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use regalloc::{
    frame::NUM_ALLOCATABLE, Allocator, Error, GraphColoringAllocator, LiveInterval, Location,
    RegisterAllocator,
};

fn random_intervals(rng: &mut StdRng, count: usize, span: u32) -> Result<Vec<LiveInterval>> {
    (0..count)
        .map(|i| {
            let start = rng.gen_range(0..span);
            let end = rng.gen_range(start..=span);
            Ok(LiveInterval::new(format!("v{}", i), start, end)?)
        })
        .collect()
}

#[test]
fn overlapping_pair_gets_distinct_registers() -> Result<()> {
    let mut alloc = GraphColoringAllocator::new();
    alloc.set_live_intervals(vec![
        LiveInterval::new("x", 1, 5)?,
        LiveInterval::new("y", 2, 6)?,
    ]);

    let x = alloc.allocate("x")?;
    let y = alloc.allocate("y")?;

    assert!(x.encode() > 0);
    assert!(y.encode() > 0);
    assert_ne!(x, y);
    assert!(!alloc.is_spilled("x") && !alloc.is_spilled("y"));
    Ok(())
}

#[test]
fn overlapping_intervals_never_share_a_register() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for round in 0..200 {
        let count = rng.gen_range(1..=24);
        let span = rng.gen_range(1..=40);
        let intervals = random_intervals(&mut rng, count, span)?;

        let mut alloc = GraphColoringAllocator::new();
        alloc.set_live_intervals(intervals.clone());

        let mut locations = Vec::with_capacity(intervals.len());
        for interval in &intervals {
            let location = alloc.allocate(interval.var())?;
            if let Location::Register(reg) = location {
                assert!(!reg.is_reserved(), "round {}: {} got {}", round, interval, reg);
            }
            locations.push(location);
        }

        for (i, a) in intervals.iter().enumerate() {
            for (j, b) in intervals.iter().enumerate().skip(i + 1) {
                if !a.overlaps(b) {
                    continue;
                }
                if let (Location::Register(ra), Location::Register(rb)) =
                    (locations[i], locations[j])
                {
                    assert_ne!(ra, rb, "round {}: {} and {} share a register", round, a, b);
                }
                if let (Location::Spilled(sa), Location::Spilled(sb)) =
                    (locations[i], locations[j])
                {
                    assert_ne!(sa, sb, "round {}: {} and {} share a slot", round, a, b);
                }
            }
        }
    }
    Ok(())
}

#[test]
fn coloring_is_reproducible() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let intervals = random_intervals(&mut rng, 20, 30)?;
    let mut reversed = intervals.clone();
    reversed.reverse();

    let mut one = GraphColoringAllocator::new();
    one.set_live_intervals(intervals.clone());
    let mut other = GraphColoringAllocator::new();
    other.set_live_intervals(reversed);

    for interval in &intervals {
        assert_eq!(one.allocate(interval.var())?, other.allocate(interval.var())?);
    }
    Ok(())
}

#[test]
fn spill_candidates_get_unique_slots() -> Result<()> {
    let intervals = (0..NUM_ALLOCATABLE + 3)
        .map(|i| LiveInterval::new(format!("v{}", i), 0, 10))
        .collect::<regalloc::Result<Vec<_>>>()?;

    let mut alloc = GraphColoringAllocator::new();
    alloc.set_live_intervals(intervals);

    let spilled = alloc.color_graph(NUM_ALLOCATABLE)?;
    assert_eq!(NUM_ALLOCATABLE + 3, spilled.len());

    let mut offsets: Vec<_> = spilled
        .iter()
        .filter_map(|var| RegisterAllocator::stack_offset(&alloc, var.as_str()))
        .collect();
    offsets.sort_unstable();
    offsets.dedup();
    assert_eq!(spilled.len(), offsets.len());
    assert!(offsets.iter().all(|&offset| offset < 0));

    assert_eq!(spilled, alloc.color_graph(NUM_ALLOCATABLE)?);
    assert_eq!(spilled.len(), alloc.spilled_count());
    Ok(())
}

#[test]
fn missing_interval_is_an_error() -> Result<()> {
    let mut alloc = Allocator::graph_coloring();
    assert_eq!(
        Err(Error::MissingInterval("x".to_string())),
        alloc.allocate_register("x")
    );
    assert_eq!(None, alloc.register("x"));
    Ok(())
}

#[test]
fn reset_forgets_everything() -> Result<()> {
    let mut alloc = Allocator::graph_coloring();
    if let Some(inner) = alloc.as_graph_coloring_mut() {
        inner.set_live_intervals(vec![
            LiveInterval::new("a", 0, 4)?,
            LiveInterval::new("b", 2, 8)?,
        ]);
    }
    alloc.allocate_register("a")?;
    alloc.allocate_register("b")?;
    assert_eq!(2, alloc.allocated_register_count());

    alloc.reset();

    assert_eq!(0, alloc.allocated_register_count());
    assert_eq!(None, alloc.register("a"));
    assert_eq!(None, alloc.register("b"));
    Ok(())
}
