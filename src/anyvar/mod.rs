//! Adapter to the AnyVar variant resolution service.

use crate::common::GenomeRelease;

pub mod http;

/// Errors raised by variant resolution backends.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not connect to AnyVar: {0}")]
    Connection(String),
    #[error("AnyVar replied with HTTP {status}: {message}")]
    Response { status: u16, message: String },
    #[error("could not decode AnyVar reply: {0}")]
    Decode(String),
    #[error("AnyVar returned {actual} ids for {expected} expressions")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Content-derived variant identifier as assigned by AnyVar (e.g., `ga4gh:VA.xyz`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VariantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A VRS allele as returned by AnyVar.
///
/// Only `id` and `type` are interpreted; `location`, `state`, and any other
/// members are carried through unchanged.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Allele {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Allele {
    /// VRS type tag of alleles.
    pub const TYPE: &'static str = "Allele";

    /// Return the variant id if the object is an identified allele.
    pub fn variant_id(&self) -> Option<VariantId> {
        match (&self.id, self.type_.as_str()) {
            (Some(id), Self::TYPE) if !id.is_empty() => Some(VariantId::new(id.as_str())),
            _ => None,
        }
    }
}

/// Operations of a variant resolution backend.
///
/// Implementations are shared across request handlers and must be thread safe.
pub trait VariantResolver: Send + Sync {
    /// Resolve each expression to its id, registering unseen ones.
    ///
    /// The result is order preserving and has one entry per expression; `None`
    /// marks an expression that could not be translated.
    fn resolve_or_register(
        &self,
        expressions: &[String],
        assembly: GenomeRelease,
    ) -> Result<Vec<Option<VariantId>>, Error>;

    /// Look up an already registered variant; `None` if it is not registered.
    fn resolve_single(
        &self,
        expression: &str,
        assembly: GenomeRelease,
    ) -> Result<Option<Allele>, Error>;

    /// Return all registered variants overlapping `[start, end]` on `accession`.
    ///
    /// An unknown accession yields an empty list.
    fn search_interval(&self, accession: &str, start: u64, end: u64)
        -> Result<Vec<Allele>, Error>;

    /// Release resources held by the backend.
    fn close(&self) {}
}

#[cfg(test)]
pub mod fake {
    //! In-memory resolver for tests.

    use std::{
        collections::{BTreeMap, BTreeSet},
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Mutex,
        },
    };

    use super::{Allele, Error, VariantId, VariantResolver};
    use crate::common::GenomeRelease;

    /// Resolver that derives ids from the expression and remembers registrations.
    #[derive(Debug, Default)]
    pub struct FakeResolver {
        registered: Mutex<BTreeMap<(GenomeRelease, String), VariantId>>,
        unresolvable: BTreeSet<String>,
        pub failing: AtomicBool,
        pub batch_calls: AtomicUsize,
        pub single_calls: AtomicUsize,
        pub search_calls: AtomicUsize,
    }

    impl FakeResolver {
        pub fn new() -> Self {
            Self::default()
        }

        /// Expressions in `unresolvable` resolve to `None` in batch calls.
        pub fn with_unresolvable<I: IntoIterator<Item = S>, S: Into<String>>(
            unresolvable: I,
        ) -> Self {
            Self {
                unresolvable: unresolvable.into_iter().map(Into::into).collect(),
                ..Default::default()
            }
        }

        /// Register `expression` under the given `id`.
        pub fn register(&self, assembly: GenomeRelease, expression: &str, id: &str) {
            self.registered
                .lock()
                .unwrap()
                .insert((assembly, expression.to_string()), VariantId::from(id));
        }

        pub fn fail(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), Error> {
            if self.failing.load(Ordering::SeqCst) {
                Err(Error::Connection("connection refused".into()))
            } else {
                Ok(())
            }
        }

        pub fn allele(id: &VariantId) -> Allele {
            serde_json::from_value(serde_json::json!({
                "id": id.as_str(),
                "type": "Allele",
                "location": {"type": "SequenceLocation", "start": 2781760, "end": 2781761},
                "state": {"type": "LiteralSequenceExpression", "sequence": "A"},
            }))
            .unwrap()
        }
    }

    impl VariantResolver for FakeResolver {
        fn resolve_or_register(
            &self,
            expressions: &[String],
            assembly: GenomeRelease,
        ) -> Result<Vec<Option<VariantId>>, Error> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            let mut registered = self.registered.lock().unwrap();
            Ok(expressions
                .iter()
                .map(|expression| {
                    if self.unresolvable.contains(expression) {
                        return None;
                    }
                    let id = registered
                        .entry((assembly, expression.clone()))
                        .or_insert_with(|| VariantId::new(format!("ga4gh:VA.{}", expression)));
                    Some(id.clone())
                })
                .collect())
        }

        fn resolve_single(
            &self,
            expression: &str,
            assembly: GenomeRelease,
        ) -> Result<Option<Allele>, Error> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self
                .registered
                .lock()
                .unwrap()
                .get(&(assembly, expression.to_string()))
                .map(Self::allele))
        }

        fn search_interval(
            &self,
            _accession: &str,
            _start: u64,
            _end: u64,
        ) -> Result<Vec<Allele>, Error> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self
                .registered
                .lock()
                .unwrap()
                .values()
                .map(Self::allele)
                .collect())
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{Allele, VariantId};

    #[test]
    fn allele_serde_keeps_unknown_members() -> Result<(), anyhow::Error> {
        let json = serde_json::json!({
            "id": "ga4gh:VA.abc",
            "type": "Allele",
            "digest": "abc",
            "location": {"start": 1, "end": 2},
            "state": {"sequence": "A"},
        });
        let allele: Allele = serde_json::from_value(json.clone())?;

        assert_eq!(allele.variant_id(), Some(VariantId::from("ga4gh:VA.abc")));
        assert_eq!(serde_json::to_value(&allele)?, json);

        Ok(())
    }

    #[rstest::rstest]
    #[case(serde_json::json!({"type": "Allele"}))]
    #[case(serde_json::json!({"id": "ga4gh:CX.1", "type": "CopyNumberCount"}))]
    #[case(serde_json::json!({"id": "", "type": "Allele"}))]
    fn allele_without_variant_id(#[case] json: serde_json::Value) -> Result<(), anyhow::Error> {
        let allele: Allele = serde_json::from_value(json)?;
        assert_eq!(allele.variant_id(), None);
        Ok(())
    }

    #[test]
    fn variant_id_is_transparent() -> Result<(), anyhow::Error> {
        let id = VariantId::from("ga4gh:VA.x");
        assert_eq!(serde_json::to_string(&id)?, "\"ga4gh:VA.x\"");
        assert_eq!(id.to_string(), "ga4gh:VA.x");
        Ok(())
    }
}
