//! # Sift Query Language - Syntax Trees
//!
//! This module defines the token alphabet and the two trees the
//! compiler pipeline flows through: the intermediate document tree
//! derived from the JSON structure of a query, and the typed Abstract
//! Syntax Tree of operator expressions.
//!
//! ## Architecture Overview
//!
//! The module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens with position metadata
//! - **[nodes]** - Document tree ([`DocNode`]) and query AST ([`QueryNode`])
//! - **[operators]** - The closed operator table with categories and arities
//!
//! ## Core Concepts
//!
//! ### Document shape
//!
//! A query is a single JSON object. Keys carrying the `$` sigil are
//! operators from the closed table; every other key is a field
//! shorthand:
//!
//! ```text
//! {"age": {"$greater": 18}}
//! ```
//!
//! filters records whose `age` exceeds 18. Sibling keys conjoin:
//!
//! ```text
//! {"age": {"$greater": 18}, "name": {"$like": "b%"}}
//! ```
//!
//! ### The pipeline stages
//!
//! - **Filter** `$filter` / field shorthand - keep or discard records
//! - **Project** `$select` / `$new` - reshape records
//! - **Order** `$orderby` / `$orderbydescending` - sort by a key
//! - **Page** `$limit` / `$skip` - decoded into a limit/offset pair
//! - **Aggregate** `$count`, `$sum`, ... - reduce to a scalar
//!
//! ### Node identity
//!
//! Every AST node carries a [`NodeId`] unique within its compilation.
//! Semantic annotations are cached by this id, which is what makes
//! re-analysis of a node idempotent.

pub mod nodes;
pub mod operators;
pub mod tokens;

pub use nodes::{DocNode, DocPair, DocValue, Literal, NodeId, Page, QueryAst, QueryExpr, QueryNode};
pub use operators::{Arity, Operator, OperatorCategory, OPERATOR_SIGIL};
pub use tokens::{Position, Span, Token, TokenKind};
