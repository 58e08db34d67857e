// src/lib.rs
// =============================================================================
// doc-linkcheck: validates the hyperlinks found in documents.
//
// - checker: the validation engine (validators, manager, result cache)
// - scan: finds the links in local Markdown and HTML documents
//
// The command-line front end lives in src/main.rs and src/cli.rs.
// =============================================================================

pub mod checker;
pub mod scan;
