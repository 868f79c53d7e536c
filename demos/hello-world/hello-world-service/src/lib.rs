#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Hello-world service
//!
//! A small HTTP application that never talks to an identity provider or a
//! policy engine itself: every decision comes from the IAM runtime.
//!
//! | Route | Runtime call | Success |
//! |---|---|---|
//! | `GET /whoami` | `ValidateCredential` | `you are: <subject>` |
//! | `GET /can-i?what=&who=` | `CheckAccess` | `yes!` (403 `no!` when denied) |
//! | `GET /access-token` | `GetAccessToken` | `new token: <token>` |
//! | `PUT /relationships/{resource_id}` | `CreateRelationships` | 204 |
//! | `DELETE /relationships/{resource_id}` | `DeleteRelationships` | 204 |

pub mod auth;
pub mod problem;
pub mod routes;

pub use routes::{AppState, router};
