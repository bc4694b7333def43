use anyhow::Result;
use regalloc::{
    frame, Allocator, Error, LinearScanAllocator, Location, RegisterAllocator, SymbolAllocator,
    SymbolId, VariableSymbol,
};

fn generate_function(
    alloc: &mut impl RegisterAllocator<VariableSymbol>,
    symbols: &[VariableSymbol],
) -> Result<Vec<Location>> {
    let mut locations = Vec::new();
    for symbol in symbols {
        locations.push(alloc.allocate_register(symbol)?);
    }
    Ok(locations)
}

#[test]
fn code_generator_sees_one_contract() -> Result<()> {
    let symbols: Vec<_> = (0..4)
        .map(|i| VariableSymbol::new(SymbolId::new(i), format!("local{}", i)))
        .collect();

    let mut linear = SymbolAllocator::new(LinearScanAllocator::new());
    let locations = generate_function(&mut linear, &symbols)?;
    assert_eq!(
        vec![8, 9, 10, 11],
        locations.iter().map(|l| l.encode()).collect::<Vec<_>>()
    );

    let mut dispatched = SymbolAllocator::new(Allocator::linear_scan());
    assert_eq!(locations, generate_function(&mut dispatched, &symbols)?);
    Ok(())
}

#[test]
fn parameter_stays_in_argument_register() -> Result<()> {
    let mut alloc = SymbolAllocator::new(LinearScanAllocator::new());
    let param = VariableSymbol::new(SymbolId::new(0), "p0");
    let a0 = frame::arg_register(0)?;

    let name = alloc.name_of(&param)?.to_string();
    alloc.delegate_mut().force_allocate(&name, a0)?;

    let local = VariableSymbol::new(SymbolId::new(1), "local1");
    assert_ne!(Some(a0), alloc.allocate_register(&local)?.register());
    assert_eq!(Some(a0), alloc.register(&param));
    Ok(())
}

#[test]
fn function_bodies_are_independent() -> Result<()> {
    let mut alloc = SymbolAllocator::new(LinearScanAllocator::new());

    let first_body = VariableSymbol::anonymous(SymbolId::new(100));
    let first = alloc.allocate_register(&first_body)?;
    assert_eq!("var1", alloc.name_of(&first_body)?);

    alloc.reset();

    let second_body = VariableSymbol::anonymous(SymbolId::new(200));
    assert_eq!(first, alloc.allocate_register(&second_body)?);
    assert_eq!("var1", alloc.name_of(&second_body)?);
    assert_eq!(None, alloc.register(&first_body));
    assert_eq!(1, alloc.managed_symbols().count());
    Ok(())
}

#[test]
fn conflicting_names_are_refused() -> Result<()> {
    let mut alloc = SymbolAllocator::new(LinearScanAllocator::new());
    alloc.allocate_register(&VariableSymbol::new(SymbolId::new(0), "x"))?;

    let result = alloc.allocate_register(&VariableSymbol::new(SymbolId::new(1), "x"));
    assert_eq!(
        Err(Error::SymbolNameConflict {
            name: "x".to_string(),
            existing: SymbolId::new(0),
            requested: SymbolId::new(1),
        }),
        result
    );
    assert_eq!(1, alloc.allocated_register_count());
    Ok(())
}
