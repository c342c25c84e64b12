//! Mkplan core library.
//!
//! Mkplan reads a manifest describing C projects and their dependencies,
//! orders the projects, works out which headers every translation unit
//! transitively includes, and writes a Makefile per project plus an aggregate
//! script that builds them all in dependency order.
//!
//! The pipeline is [`manifest`] → [`config`] → [`ir::Workspace`] →
//! [`make_gen`], with [`runner`] persisting the result.

pub mod ast;
pub mod cli;
pub mod closure;
pub mod config;
pub mod inventory;
pub mod ir;
pub mod make_gen;
pub mod manifest;
pub mod runner;
pub mod scanner;
