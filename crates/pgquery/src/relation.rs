//! Declared foreign-key relations between tables.
//!
//! A [`RelationGraph`] is searched in both directions: asking for `(a, b)`
//! finds a relation declared as `a -> b` or as `b -> a`. The relation always
//! keeps its declared orientation, so the join predicate reads
//! `from.foreign_key = to.references` whichever side asked.

use crate::error::{QueryError, QueryResult};
use crate::ident::validate_ident;
use serde::{Deserialize, Serialize};

/// Cardinality tag. Informational only; the compiler never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// A foreign key on `from.foreign_key` referencing `to.references`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub cardinality: Cardinality,
    pub foreign_key: String,
    pub references: String,
}

impl Relation {
    /// Declare `from.foreign_key -> to.references`.
    pub fn new(
        from: impl Into<String>,
        foreign_key: impl Into<String>,
        to: impl Into<String>,
        references: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cardinality,
            foreign_key: foreign_key.into(),
            references: references.into(),
        }
    }

    /// The join predicate text: `from.foreign_key = to.references`.
    pub fn on_clause(&self) -> String {
        format!(
            "{}.{} = {}.{}",
            self.from, self.foreign_key, self.to, self.references
        )
    }

    /// Whether this relation links `a` and `b`, in either direction.
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    fn validate(&self) -> QueryResult<()> {
        validate_ident(&self.from)?;
        validate_ident(&self.to)?;
        validate_ident(&self.foreign_key)?;
        validate_ident(&self.references)
    }
}

/// Immutable list of declared relations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGraph {
    relations: Vec<Relation>,
}

impl RelationGraph {
    /// Build a graph from declared relations.
    ///
    /// Every table and column name is checked, since they are spliced into
    /// join text verbatim.
    pub fn new(relations: impl IntoIterator<Item = Relation>) -> QueryResult<Self> {
        let relations: Vec<Relation> = relations.into_iter().collect();
        for relation in &relations {
            relation.validate()?;
        }
        Ok(Self { relations })
    }

    /// An empty graph; every join fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Find the relation between `a` and `b`. Declaration order breaks ties.
    pub fn resolve(&self, a: &str, b: &str) -> QueryResult<&Relation> {
        self.relations
            .iter()
            .find(|r| r.links(a, b))
            .ok_or_else(|| QueryError::relation_not_found(a, b))
    }

    /// All relations touching `table`.
    pub fn relations_of<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations
            .iter()
            .filter(move |r| r.from == table || r.to == table)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
