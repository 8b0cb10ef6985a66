use kgforge_schema::{
    ClassHierarchyGenerator, ClassHierarchyParams, ClassSchema, GenRng, ProfileSide,
    PropertyTables, PropertyTargets, RelationProperty, RelationSchema, RelationSchemaGenerator,
    RelationSchemaParams,
};
use proptest::prelude::*;

fn class_schema(seed: u64) -> ClassSchema {
    let mut rng = GenRng::seed_from_u64(seed);
    ClassHierarchyGenerator::new(ClassHierarchyParams {
        num_classes: 30,
        max_depth: 4,
        avg_depth: 2.5,
        inheritance_ratio: 2.0,
        avg_disjointness: 0.2,
    })
    .expect("valid class params")
    .generate(&mut rng)
    .expect("class schema")
}

fn targets() -> impl Strategy<Value = PropertyTargets> {
    (
        (0.0f64..0.5, 0.0f64..0.5, 0.0f64..0.5, 0.0f64..0.5),
        (0.0f64..0.3, 0.0f64..0.3, 0.0f64..0.3),
        (0.0f64..0.6, 0.0f64..0.5),
    )
        .prop_map(
            |(
                (reflexive, irreflexive, symmetric, asymmetric),
                (transitive, functional, inverse_functional),
                (inverse_of, subproperty),
            )| {
                let subproperty = if functional > 0.0 && inverse_functional > 0.0 {
                    0.0
                } else {
                    subproperty
                };
                PropertyTargets {
                    reflexive,
                    irreflexive,
                    symmetric,
                    asymmetric,
                    transitive,
                    functional,
                    inverse_functional,
                    inverse_of,
                    subproperty,
                }
            },
        )
}

fn relation_params() -> impl Strategy<Value = RelationSchemaParams> {
    (
        1u32..=40,
        1.0f64..4.0,
        0.0f64..=1.0,
        prop_oneof![Just(ProfileSide::Both), Just(ProfileSide::Partial)],
        targets(),
    )
        .prop_map(
            |(num_relations, relation_specificity, profiled_ratio, profile_side, targets)| {
                RelationSchemaParams {
                    num_relations,
                    relation_specificity,
                    profiled_ratio,
                    profile_side,
                    targets,
                }
            },
        )
}

fn generate(classes: &ClassSchema, params: RelationSchemaParams, seed: u64) -> RelationSchema {
    let tables = PropertyTables::builtin().expect("builtin tables");
    let mut rng = GenRng::seed_from_u64(seed);
    RelationSchemaGenerator::new(classes, &tables, params)
        .expect("valid relation params")
        .generate(&mut rng)
        .expect("relation schema")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn relations_respect_their_flags(params in relation_params(), seed in any::<u64>()) {
        let classes = class_schema(seed);
        let schema = generate(&classes, params, seed);
        let tables = PropertyTables::builtin().unwrap();

        prop_assert_eq!(schema.len() as u32, params.num_relations);
        for r in schema.iter() {
            prop_assert!(tables.is_admissible(r.properties));
            if r.has(RelationProperty::Reflexive) {
                prop_assert_eq!((r.domain, r.range), (None, None));
            }
            let equal_sides = r.has(RelationProperty::Symmetric) || r.has(RelationProperty::Transitive);
            if equal_sides && r.domain.is_some() && r.range.is_some() {
                prop_assert_eq!(r.domain, r.range);
            }
        }
    }

    #[test]
    fn inverse_of_is_an_involution(params in relation_params(), seed in any::<u64>()) {
        let classes = class_schema(seed);
        let schema = generate(&classes, params, seed);

        for r in schema.iter() {
            if let Some(inv) = r.inverse {
                prop_assert_ne!(inv, r.id);
                prop_assert_eq!(schema.inverse_of(inv), Some(r.id));
                prop_assert!(!r.has(RelationProperty::Symmetric));
                prop_assert!(!r.has(RelationProperty::Reflexive));
            }
        }
    }

    #[test]
    fn subproperty_links_form_no_cycles(params in relation_params(), seed in any::<u64>()) {
        let classes = class_schema(seed);
        let schema = generate(&classes, params, seed);

        for r in schema.iter() {
            let mut cursor = r.super_relation;
            let mut steps = 0;
            while let Some(next) = cursor {
                prop_assert_ne!(next, r.id);
                steps += 1;
                prop_assert!(steps <= schema.len());
                cursor = schema.super_of(next);
            }
        }
    }

    #[test]
    fn relation_generation_is_deterministic(params in relation_params(), seed in any::<u64>()) {
        let classes = class_schema(seed);
        prop_assert_eq!(generate(&classes, params, seed), generate(&classes, params, seed));
    }
}
