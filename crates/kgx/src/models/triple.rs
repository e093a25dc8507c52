use serde::Serialize;
use serde_json::{json, Value};

/// A (head, relation, tail) assertion plus the source sentence that supports it.
///
/// Every field is trimmed and non-empty. The only way to build one is [`Triple::new`], so a
/// value of this type is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Triple {
    head: String,
    relation: String,
    tail: String,
    evidence: String,
}

impl Triple {
    /// Trim all four fields and build the triple, or `None` if any of them ends up empty
    pub fn new(
        head: impl AsRef<str>,
        relation: impl AsRef<str>,
        tail: impl AsRef<str>,
        evidence: impl AsRef<str>,
    ) -> Option<Self> {
        let head = head.as_ref().trim();
        let relation = relation.as_ref().trim();
        let tail = tail.as_ref().trim();
        let evidence = evidence.as_ref().trim();

        if head.is_empty() || relation.is_empty() || tail.is_empty() || evidence.is_empty() {
            return None;
        }

        Some(Self {
            head: head.to_string(),
            relation: relation.to_string(),
            tail: tail.to_string(),
            evidence: evidence.to_string(),
        })
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    pub fn evidence(&self) -> &str {
        &self.evidence
    }

    /// The JSON object shape the prompts and the parser agree on
    pub fn to_json(&self) -> Value {
        json!({
            "head": self.head,
            "relation": self.relation,
            "tail": self.tail,
            "evidence": self.evidence,
        })
    }
}

/// Serialize a list of triples as the JSON array embedded in verification prompts
pub fn triples_to_json(triples: &[Triple]) -> Value {
    Value::Array(triples.iter().map(Triple::to_json).collect())
}
