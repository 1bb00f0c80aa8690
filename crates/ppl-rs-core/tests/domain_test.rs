use num_bigint::BigInt;
use ppl_rs_core::*;

const X: Variable = Variable::new(0);
const Y: Variable = Variable::new(1);

fn closed(constraints: &[Constraint]) -> CPolyhedron {
    let cs = ConstraintSystem::from_descriptors(constraints).unwrap();
    Domain::<CPolyhedron>::create_from_constraints(&cs).unwrap()
}

fn unit_square() -> CPolyhedron {
    closed(&[
        Constraint::ge(X, 0),
        Constraint::le(X, 1),
        Constraint::ge(Y, 0),
        Constraint::le(Y, 1),
    ])
}

#[test]
fn universe_and_empty_for_every_dimension() {
    for d in 0..4usize {
        let u = Domain::<CPolyhedron>::create(d, Degenerate::Universe).unwrap();
        assert!(u.is_universe().unwrap());
        assert_eq!(u.space_dimension().unwrap(), d);

        let e = Domain::<NncPolyhedron>::create(d, Degenerate::Empty).unwrap();
        assert!(e.is_empty().unwrap());
        assert_eq!(e.space_dimension().unwrap(), d);

        let b = Domain::<RationalBox>::create(d, Degenerate::Empty).unwrap();
        assert!(b.is_empty().unwrap());
    }
    let u = Domain::<CPolyhedron>::create(2u8, Degenerate::Universe).unwrap();
    assert_eq!(u.to_string(), "true");
    let e = Domain::<CPolyhedron>::create(2i64, Degenerate::Empty).unwrap();
    assert_eq!(e.to_string(), "false");
}

#[test]
fn negative_dimension_is_a_length_error() {
    let err = Domain::<CPolyhedron>::create(-1, Degenerate::Universe).unwrap_err();
    assert!(matches!(err, PplError::Length(_)));
    let err = Domain::<RationalBox>::create(usize::MAX, Degenerate::Universe).unwrap_err();
    assert!(matches!(err, PplError::Length(_)));
}

#[test]
fn contradictory_bounds_are_empty() {
    let mut p = Domain::<CPolyhedron>::create(1, Degenerate::Universe).unwrap();
    p.add_constraint(&Constraint::ge(X, 3)).unwrap();
    assert!(!p.is_empty().unwrap());
    p.add_constraint(&Constraint::le(X, 2)).unwrap();
    assert!(p.is_empty().unwrap());
}

#[test]
fn extrema_of_a_half_line() {
    let p = closed(&[Constraint::ge(X, -3)]);
    let x = LinearExpression::from(X);
    assert!(p.maximize(&x).unwrap().is_none());
    assert!(!p.bounds_from_above(&x).unwrap());
    assert!(p.bounds_from_below(&x).unwrap());

    let min = p.minimize(&x).unwrap().unwrap();
    assert_eq!(min.numerator, BigInt::from(-3));
    assert_eq!(min.denominator, BigInt::from(1));
    assert!(min.attained);
    assert_eq!(min.point, Generator::point(X * -3, 1).unwrap());
}

#[test]
fn supremum_of_an_open_set_is_not_attained() {
    let cs = ConstraintSystem::from_descriptors(&[Constraint::ge(X, 0), Constraint::lt(X * 2, 1)])
        .unwrap();
    let p = Domain::<NncPolyhedron>::create_from_constraints(&cs).unwrap();
    let max = p.maximize(&X.into()).unwrap().unwrap();
    assert_eq!(max.numerator, BigInt::from(1));
    assert_eq!(max.denominator, BigInt::from(2));
    assert!(!max.attained);
    assert_eq!(max.point.generator_type(), GeneratorType::ClosurePoint);
}

#[test]
fn intersection_is_idempotent() {
    let p = unit_square();
    let mut q = p.try_clone().unwrap();
    q.intersection_assign(&p).unwrap();
    assert!(q.equals(&p).unwrap());
    assert!(q == p);
}

#[test]
fn rejected_comparisons_read_as_unequal() {
    let line = Domain::<CPolyhedron>::create(1, Degenerate::Universe).unwrap();
    let plane = Domain::<CPolyhedron>::create(2, Degenerate::Universe).unwrap();
    assert!(matches!(line.equals(&plane), Err(PplError::InvalidArgument(_))));
    assert!(line != plane);
}

#[test]
fn constraints_and_generators_describe_the_same_set() {
    let p = unit_square();
    let gs = p.minimized_generators().unwrap();
    assert_eq!(gs.len().unwrap(), 4);
    assert!(gs.iter().unwrap().all(|g| g.unwrap().generator_type() == GeneratorType::Point));
    let from_gens = Domain::<CPolyhedron>::create_from_generators(&gs).unwrap();
    assert!(from_gens.equals(&p).unwrap());

    let cs = from_gens.minimized_constraints().unwrap();
    let back = Domain::<CPolyhedron>::create_from_constraints(&cs).unwrap();
    assert!(back.equals(&p).unwrap());
}

#[test]
fn polyhedron_from_generators() {
    let gs = GeneratorSystem::from_descriptors(&[
        Generator::point(LinearExpression::with_dimension(2), 1).unwrap(),
        Generator::ray(X).unwrap(),
        Generator::ray(Y).unwrap(),
    ])
    .unwrap();
    let q = Domain::<CPolyhedron>::create_from_generators(&gs).unwrap();
    let quadrant = closed(&[Constraint::ge(X, 0), Constraint::ge(Y, 0)]);
    assert!(q.equals(&quadrant).unwrap());
    assert!(!q.is_bounded().unwrap());

    let mut q = q;
    q.add_generator(&Generator::point(X * -1, 1).unwrap()).unwrap();
    assert!(q.contains(&quadrant).unwrap());
    assert!(q.strictly_contains(&quadrant).unwrap());
}

#[test]
fn closed_polyhedra_reject_strict_inequalities() {
    let mut p = Domain::<CPolyhedron>::create(1, Degenerate::Universe).unwrap();
    let err = p.add_constraint(&Constraint::gt(X, 0)).unwrap_err();
    assert!(matches!(err, PplError::Domain(_)));
    p.refine_with_constraint(&Constraint::gt(X, 0)).unwrap();
    assert!(p.equals(&closed(&[Constraint::ge(X, 0)])).unwrap());

    let mut n = Domain::<NncPolyhedron>::create(1, Degenerate::Universe).unwrap();
    n.add_constraint(&Constraint::gt(X, 0)).unwrap();
    assert!(!n.is_topologically_closed().unwrap());
    n.topological_closure_assign().unwrap();
    assert!(n.is_topologically_closed().unwrap());
}

#[test]
fn closure_points_need_an_nnc_polyhedron() {
    let mut p = closed(&[Constraint::ge(X, 0), Constraint::le(X, 1)]);
    let err = p
        .add_generator(&Generator::closure_point(X * 2, 1).unwrap())
        .unwrap_err();
    assert!(matches!(err, PplError::Domain(_)));
}

#[test]
fn relation_with_constraint() {
    let p = closed(&[Constraint::ge(X, 0), Constraint::le(X, 5)]);
    let r = p.relation_with_constraint(&Constraint::ge(X, 0)).unwrap();
    assert!(r.is_included());
    assert!(!r.saturates());
    assert!(p.relation_with_constraint(&Constraint::ge(X, 6)).unwrap().is_disjoint());
    assert!(
        p.relation_with_constraint(&Constraint::ge(X, 3))
            .unwrap()
            .strictly_intersects()
    );
    let point = closed(&[Constraint::equal(X, 0)]);
    let r = point.relation_with_constraint(&Constraint::ge(X, 0)).unwrap();
    assert!(r.is_included() && r.saturates());
}

#[test]
fn affine_image_and_preimage() {
    let mut p = closed(&[Constraint::ge(X, 0), Constraint::le(X, 1)]);
    p.affine_image(X, &(X * 2 + 1), 1).unwrap();
    assert!(p.equals(&closed(&[Constraint::ge(X, 1), Constraint::le(X, 3)])).unwrap());
    p.affine_preimage(X, &(X * 2 + 1), 1).unwrap();
    assert!(p.equals(&closed(&[Constraint::ge(X, 0), Constraint::le(X, 1)])).unwrap());

    let err = p.affine_image(X, &X.into(), 0).unwrap_err();
    assert!(matches!(err, PplError::InvalidArgument(_)));
}

#[test]
fn dimension_changes() {
    let mut p = closed(&[Constraint::ge(X, 0)]);
    p.add_space_dimensions_and_embed(2).unwrap();
    assert_eq!(p.space_dimension().unwrap(), 3);
    assert!(!p.constrains(Variable::new(2)).unwrap());
    p.add_space_dimensions_and_project(1u32).unwrap();
    assert_eq!(p.space_dimension().unwrap(), 4);
    assert!(p.constrains(Variable::new(3)).unwrap());
    assert_eq!(p.affine_dimension().unwrap(), 3);

    p.remove_space_dimensions(&[Variable::new(1), Variable::new(3)]).unwrap();
    assert_eq!(p.space_dimension().unwrap(), 2);
    p.remove_higher_space_dimensions(1).unwrap();
    assert!(p.equals(&closed(&[Constraint::ge(X, 0)])).unwrap());

    assert!(matches!(
        p.add_space_dimensions_and_embed(-2),
        Err(PplError::Length(_))
    ));
}

#[test]
fn unconstrain_forgets_a_variable() {
    let mut p = unit_square();
    p.unconstrain(Y).unwrap();
    assert!(!p.constrains(Y).unwrap());
    assert!(p.constrains(X).unwrap());
}

#[test]
fn hull_and_difference() {
    let left = closed(&[Constraint::ge(X, 0), Constraint::le(X, 1)]);
    let right = closed(&[Constraint::ge(X, 3), Constraint::le(X, 4)]);
    assert!(left.is_disjoint_from(&right).unwrap());

    let mut hull = left.try_clone().unwrap();
    hull.upper_bound_assign(&right).unwrap();
    assert!(hull.equals(&closed(&[Constraint::ge(X, 0), Constraint::le(X, 4)])).unwrap());

    let mut rest = hull.try_clone().unwrap();
    rest.difference_assign(&right).unwrap();
    assert!(rest.contains(&left).unwrap());
    assert!(hull.contains(&rest).unwrap());
}

#[test]
fn concatenation_appends_dimensions() {
    let mut p = closed(&[Constraint::ge(X, 0)]);
    let q = closed(&[Constraint::le(X, 1)]);
    p.concatenate_assign(&q).unwrap();
    assert_eq!(p.space_dimension().unwrap(), 2);
    assert!(p.equals(&closed(&[Constraint::ge(X, 0), Constraint::le(Y, 1)])).unwrap());
}

#[test]
fn time_elapse_follows_the_directions_of_the_other_set() {
    let mut p = closed(&[Constraint::equal(X, 0)]);
    let speed = closed(&[Constraint::equal(X, 1)]);
    p.time_elapse_assign(&speed).unwrap();
    assert!(p.equals(&closed(&[Constraint::ge(X, 0)])).unwrap());
}

#[test]
fn congruences_on_polyhedra() {
    let mut p = Domain::<CPolyhedron>::create(1, Degenerate::Universe).unwrap();
    let err = p
        .add_congruence(&Congruence::modulo(X, 1, 2).unwrap())
        .unwrap_err();
    assert!(matches!(err, PplError::InvalidArgument(_)));
    p.refine_with_congruence(&Congruence::modulo(X, 1, 2).unwrap())
        .unwrap();
    assert!(p.is_universe().unwrap());

    p.add_congruence(&Congruence::equality(X, 2)).unwrap();
    let cgs = p.minimized_congruences().unwrap();
    assert!(!cgs.is_empty().unwrap());
    let from_cgs = Domain::<CPolyhedron>::create_from_congruences(&cgs).unwrap();
    assert!(from_cgs.equals(&p).unwrap());
}

#[test]
fn plural_refinements_are_all_or_nothing() {
    let mut p = Domain::<CPolyhedron>::create(1, Degenerate::Universe).unwrap();
    let cs = ConstraintSystem::from_descriptors(&[Constraint::ge(X, 0), Constraint::gt(X, 1)])
        .unwrap();
    assert!(matches!(p.add_constraints(&cs), Err(PplError::Domain(_))));
    assert!(p.is_universe().unwrap());
    p.refine_with_constraints(&cs).unwrap();
    assert!(p.equals(&closed(&[Constraint::ge(X, 1)])).unwrap());
}

#[test]
fn dimension_mismatch_is_an_invalid_argument() {
    let mut p = Domain::<CPolyhedron>::create(1, Degenerate::Universe).unwrap();
    let q = Domain::<CPolyhedron>::create(2, Degenerate::Universe).unwrap();
    assert!(matches!(
        p.intersection_assign(&q),
        Err(PplError::InvalidArgument(_))
    ));
    assert!(matches!(
        p.add_constraint(&Constraint::ge(Y, 0)),
        Err(PplError::InvalidArgument(_))
    ));
}

#[test]
fn mutators_chain() {
    let mut p = Domain::<CPolyhedron>::create(2, Degenerate::Universe).unwrap();
    p.add_constraint(&Constraint::ge(X, 0))
        .unwrap()
        .add_constraint(&Constraint::le(X, 1))
        .unwrap()
        .add_constraint(&Constraint::ge(Y, 0))
        .unwrap()
        .add_constraint(&Constraint::le(Y, 1))
        .unwrap();
    assert!(p.equals(&unit_square()).unwrap());
}

#[test]
fn conversions_between_domains() {
    let triangle = closed(&[
        Constraint::ge(X, 0),
        Constraint::ge(Y, 0),
        Constraint::le(X + Y, 1),
    ]);
    let b: RationalBox = Domain::create_from(&triangle).unwrap();
    let square: CPolyhedron = Domain::create_from(&b).unwrap();
    assert!(square.equals(&unit_square()).unwrap());

    let nnc: NncPolyhedron = Domain::create_from(&triangle).unwrap();
    let back: CPolyhedron =
        Domain::create_from_with_complexity(&nnc, Complexity::Polynomial).unwrap();
    assert!(back.equals(&triangle).unwrap());
}
