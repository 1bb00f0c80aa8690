use ppl_rs_core::*;

const X: Variable = Variable::new(0);

fn interval<T: Property>(lo: i64, hi: i64) -> T {
    let cs = ConstraintSystem::from_descriptors(&[Constraint::ge(X, lo), Constraint::le(X, hi)])
        .unwrap();
    T::from_constraints(&cs).unwrap()
}

fn half_line<T: Property>(lo: i64) -> T {
    let cs = ConstraintSystem::singleton(&Constraint::ge(X, lo)).unwrap();
    T::from_constraints(&cs).unwrap()
}

#[test]
fn h79_stabilizes_an_ascending_chain() {
    let mut x: CPolyhedron = interval(0, 1);
    let mut steps = 0;
    for hi in 2..20 {
        let mut next: CPolyhedron = interval(0, hi);
        next.upper_bound_assign(&x).unwrap();
        next.widening_assign(&x, None).unwrap();
        assert!(next.contains(&x).unwrap());
        steps += 1;
        if next.equals(&x).unwrap() {
            break;
        }
        x = next;
    }
    assert!(steps <= 2);
    assert!(x.equals(&half_line(0)).unwrap());
}

#[test]
fn tokens_keep_the_receiver_while_they_last() {
    let y: CPolyhedron = interval(0, 0);
    let mut x: CPolyhedron = interval(0, 1);
    let mut tokens = WideningToken::new(1);

    x.widening_assign(&y, Some(&mut tokens)).unwrap();
    assert_eq!(tokens.remaining(), 0);
    assert!(x.equals(&interval(0, 1)).unwrap());

    x.widening_assign(&y, Some(&mut tokens)).unwrap();
    assert_eq!(tokens.remaining(), 0);
    assert!(x.equals(&half_line(0)).unwrap());
}

#[test]
fn registered_operators_are_found_by_name() {
    let h79 = Domain::<CPolyhedron>::widening("H79").unwrap();
    assert_eq!(h79.name(), "H79");
    assert_eq!(Domain::<NncPolyhedron>::standard_widening().unwrap().name(), "H79");
    let refinement = Domain::<NncPolyhedron>::narrowing("bounded_refinement").unwrap();
    assert_eq!(refinement.name(), "bounded_refinement");
    assert_eq!(Domain::<RationalBox>::widening("CC76").unwrap().name(), "CC76");
    assert_eq!(Domain::<RationalBox>::narrowing("CC76").unwrap().name(), "CC76");

    assert!(matches!(
        Domain::<CPolyhedron>::widening("CC76"),
        Err(PplError::InvalidArgument(_))
    ));
    assert!(matches!(
        Domain::<RationalBox>::narrowing("H79"),
        Err(PplError::InvalidArgument(_))
    ));

    let mut x: CPolyhedron = interval(0, 1);
    h79.apply(&mut x, &interval(0, 0), None).unwrap();
    assert!(x.equals(&half_line(0)).unwrap());
}

#[test]
fn cc76_jumps_to_stop_points() {
    let y: RationalBox = interval(0, 0);
    let mut x: RationalBox = interval(0, 1);
    x.widening_assign(&y, None).unwrap();
    assert!(x.equals(&interval(0, 1)).unwrap());

    let mut x: RationalBox = interval(0, 3);
    x.widening_assign(&y, None).unwrap();
    assert!(x.equals(&half_line(0)).unwrap());
}

#[test]
fn narrowing_recovers_lost_bounds() {
    let mut b: RationalBox = half_line(0);
    b.narrowing_assign(&interval(0, 10)).unwrap();
    assert!(b.equals(&interval(0, 10)).unwrap());

    let mut p: CPolyhedron = half_line(0);
    let bounded = Domain::<CPolyhedron>::narrowing("bounded_refinement").unwrap();
    bounded.apply(&mut p, &interval(0, 10)).unwrap();
    assert!(p.equals(&interval(0, 10)).unwrap());
}

#[test]
fn limited_extrapolation_keeps_entailed_constraints() {
    let y: CPolyhedron = interval(0, 0);
    let mut x: CPolyhedron = interval(0, 1);
    let limit = ConstraintSystem::singleton(&Constraint::le(X, 5)).unwrap();
    x.limited_h79_extrapolation_assign(&y, &limit, None).unwrap();
    assert!(x.equals(&interval(0, 5)).unwrap());

    let mut x: CPolyhedron = interval(0, 1);
    x.bounded_h79_extrapolation_assign(&y, &limit, None).unwrap();
    assert!(x.equals(&interval(0, 1)).unwrap());

    let y: RationalBox = interval(0, 0);
    let mut b: RationalBox = interval(0, 3);
    b.limited_cc76_extrapolation_assign(&y, &limit, None).unwrap();
    assert!(b.equals(&interval(0, 5)).unwrap());
}

/// `x := 0; while x < 10 { x += 1 }` over boxes.
fn counter_loop(x: &RationalBox) -> Result<RationalBox> {
    let mut body = x.try_clone()?;
    body.refine_with_constraint(&Constraint::le(X, 9))?;
    body.affine_image(X, &(X + 1), 1)?;
    let mut entry: RationalBox = interval(0, 0);
    entry.upper_bound_assign(&body)?;
    Ok(entry)
}

#[test]
fn ascending_fixpoint_of_a_counter() {
    let start: RationalBox = interval(0, 0);
    let options = FixpointOptions::default();
    let fp = ascending_fixpoint(start, counter_loop, &options).unwrap();
    assert!(fp.value.contains(&interval(0, 10)).unwrap());
    assert!(fixpoint::is_post_fixpoint(&fp.value, counter_loop).unwrap());
    assert!(fp.iterations > 1);
}

#[test]
fn narrowing_phase_recovers_the_loop_bound() {
    let start: RationalBox = interval(0, 0);
    let options = FixpointOptions {
        narrowing_steps: 4,
        ..FixpointOptions::default()
    };
    let fp = fixpoint(start, counter_loop, &options).unwrap();
    assert!(fp.value.equals(&interval(0, 10)).unwrap());
}

#[test]
fn fixpoint_gives_up_after_the_iteration_limit() {
    let start: CPolyhedron = interval(0, 0);
    let options = FixpointOptions {
        max_iterations: 1,
        ..FixpointOptions::default()
    };
    let shift = |x: &CPolyhedron| -> Result<CPolyhedron> {
        let mut y = x.try_clone()?;
        y.affine_image(X, &(X + 1), 1)?;
        Ok(y)
    };
    let err = ascending_fixpoint(start, shift, &options).unwrap_err();
    assert!(matches!(err, PplError::Logic(_)));
}
