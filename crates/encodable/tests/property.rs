pub mod fixtures;

use encodable::prelude::*;
use encodable::{ModelType, Name};
use fixtures::*;
use proptest::prelude::*;
use proptest::sample::subsequence;

const FIELDS: [&str; 7] =
    ["id", "login", "email", "first_name", "last_name", "encrypted_password", "admin"];

fn field_subset() -> impl Strategy<Value = Vec<&'static str>> {
    subsequence(FIELDS.to_vec(), 0..=FIELDS.len())
}

proptest! {
    #[test]
    fn hiding_is_idempotent(names in field_subset(), repeats in 1usize..4) {
        let once = EncodableRegistry::new();
        once.configure::<User>().hidden(names.clone()).unwrap();

        let many = EncodableRegistry::new();
        for _ in 0..repeats {
            many.configure::<User>().hidden(names.clone()).unwrap();
        }

        let schema = User::model_schema();
        let once_resolved = once.resolve(&schema, &ViewName::DEFAULT);
        let many_resolved = many.resolve(&schema, &ViewName::DEFAULT);
        prop_assert_eq!(once_resolved.blacklist(), many_resolved.blacklist());
    }

    #[test]
    fn whitelist_emits_exactly_the_declared_fields_in_order(
        declared in field_subset().prop_filter("at least one field", |d| !d.is_empty()),
        shuffle in any::<bool>(),
    ) {
        let mut declared = declared;
        if shuffle {
            declared.reverse();
        }
        let registry = EncodableRegistry::new();
        registry.configure::<User>().visible(declared.clone()).unwrap();

        let encoded = encode(&registry, &user(), &SerializationRequest::new());
        prop_assert_eq!(keys(&encoded), declared);
    }

    #[test]
    fn except_never_adds_keys(declared in field_subset(), except in field_subset()) {
        let registry = EncodableRegistry::new();
        if !declared.is_empty() {
            registry.configure::<User>().visible(declared).unwrap();
        }

        let full = encode(&registry, &user(), &SerializationRequest::new());
        let narrowed = encode(&registry, &user(), &SerializationRequest::new().except(except.clone()));

        for key in keys(&narrowed) {
            prop_assert!(keys(&full).contains(&key));
            prop_assert!(!except.contains(&key));
        }
    }

    #[test]
    fn propagated_exclusions_skip_declared_names(
        parent in field_subset(),
        except in field_subset(),
    ) {
        let registry = EncodableRegistry::new();
        let mut parent: Vec<Name> = parent.into_iter().map(Name::from).collect();
        parent.push("permissions".into());
        registry.configure::<User>().visible(parent.clone()).unwrap();

        let request = SerializationRequest::new().except(except.clone());
        let encoded = encode(&registry, &user(), &request);
        let nested = keys(&encoded["permissions"][0]);

        for field in ["id", "user_id", "name"] {
            let cascaded = except.contains(&field) && !parent.iter().any(|p| p == field);
            prop_assert_eq!(nested.contains(&field), !cascaded);
        }
    }
}
