//! # Insights API
//!
//! A read-only HTTP API over a collection of dashboard insight records, plus
//! a seeding command that replaces the collection from a JSON file.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  HTTP API  │──▶│ Query layer │──▶│ Store (trait)│
//! │  (axum)    │   │ filter/aggr │   │ SQLite / mem │
//! └────────────┘   └─────────────┘   └──────▲───────┘
//!                                           │
//!                  ┌────────────┐           │
//!                  │ insights   │───────────┘
//!                  │ seed -i/-d │
//!                  └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! insights init                 # create the schema
//! insights seed -i              # load ./jsondata.json
//! insights serve                # start the API on $PORT
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`models`] | The insight record |
//! | [`filter`] | Declarative filter table and predicates |
//! | [`query`] | List, filter-option and statistics operations |
//! | [`store`] | Storage trait with SQLite and in-memory backends |
//! | [`server`] | HTTP surface |
//! | [`seed`] | Bulk import / destroy |
//! | [`stats`] | Console statistics report |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema setup |

pub mod config;
pub mod db;
pub mod filter;
pub mod migrate;
pub mod models;
pub mod query;
pub mod seed;
pub mod server;
pub mod stats;
pub mod store;
