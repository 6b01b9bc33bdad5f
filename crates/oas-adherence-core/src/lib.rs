//! OAS Adherence Core
//!
//! The schema-driven data engine behind API adherence testing. Given a
//! schema from a dereferenced OpenAPI 3.0 document it can:
//!
//! - **Generate** values that satisfy the schema
//! - **Generate deficiencies**: values that break exactly one constraint,
//!   tagged with what they break and where
//! - **Validate** arbitrary JSON values, returning path-addressed error
//!   records
//!
//! ## Architecture
//!
//! 1. **Schema** (`schema`): the recognized vocabulary subset (`type`,
//!    `enum`, `oneOf`, `required`, `properties`, `items`, `minimum`,
//!    `maximum`, `minLength`, `maxLength`, `pattern`, `format`).
//!
//! 2. **Generators** (`generator`, `deficient`): recursive walks over a
//!    schema producing conformant or single-fault values.
//!
//! 3. **Validator** (`validator`): a recursive walk over a value and its
//!    schema producing [`ErrorRecord`]s.
//!
//! The three engines step through schemas the same way (object to
//! properties, array to items, `oneOf` to alternatives) and address
//! locations with the same [`JsonPath`] steps, so a deficiency's path and
//! the validator's error path name the same location.
//!
//! Everything here is synchronous and free of shared state. Randomness is
//! always passed in as a [`rand::Rng`].
//!
//! ## Example
//!
//! ```rust
//! use oas_adherence_core::{
//!     DeficiencyKind, DeficientGenerator, JsonPath, Schema, Validator,
//!     ConformantGenerator,
//! };
//! use rand::{rngs::StdRng, SeedableRng};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(&json!({
//!     "type": "object",
//!     "required": ["breed"],
//!     "properties": {
//!         "breed": { "type": "string", "enum": ["Dingo", "Husky"] },
//!         "age": { "type": "integer", "minimum": 0, "maximum": 20 }
//!     }
//! }))
//! .unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//! let root = JsonPath::root();
//! let validator = Validator::default();
//!
//! let dog = ConformantGenerator::new().generate(Some(&schema), &root, &mut rng).unwrap();
//! assert!(validator.validate_value(&dog, &schema, &root).is_empty());
//!
//! let faults = DeficientGenerator::default().generate(
//!     DeficiencyKind::NumberRange,
//!     &schema,
//!     &root,
//!     &mut rng,
//! );
//! assert_eq!(faults.len(), 2);
//! ```

pub mod deficient;
pub mod error;
pub mod format;
pub mod generator;
pub mod path;
pub mod report;
pub mod schema;
pub mod validator;

pub use deficient::{
    generate_deficient, Deficiency, DeficiencyKind, DeficiencyOptions, DeficientGenerator, Target,
};
pub use error::{CoreError, Result};
pub use generator::pattern::PatternError;
pub use generator::{generate_conformant, generate_headers, ConformantGenerator, Overrides};
pub use path::JsonPath;
pub use report::{ErrorDetails, ErrorKind, ErrorRecord};
pub use schema::{Parameter, ParameterLocation, Schema, SchemaType, StringFormat};
pub use validator::{validate, ValidationOptions, Validator};
