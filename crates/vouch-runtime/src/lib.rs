//! # vouch-runtime
//!
//! LLM-backed fact-check and response-guard stages for Vouch.
//!
//! `vouch-core` builds prompts and interprets replies without side effects.
//! This crate adds the parts that talk to the outside world: model providers,
//! the settings store, and the two orchestrators that wire everything into a
//! single awaited call per stage.
//!
//! ## Failure policy
//!
//! Neither stage returns an error. They fail in opposite directions:
//!
//! - [`FactChecker::evaluate`] falls back to an `indeterminate` verdict and
//!   never reports a pass it could not confirm.
//! - [`ResponseGuard::apply`] fails open and delivers the original text
//!   unless the guard model explicitly answered `allow: false`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vouch_runtime::{FactChecker, ProviderRegistry, ResponseGuard};
//! use vouch_core::{ConfigSources, EvaluationRequest, FactCheckLayer, GuardLayer};
//!
//! let registry = Arc::new(ProviderRegistry::with_defaults(&serde_json::json!({})));
//! let sources = ConfigSources::from_process_env()?;
//! let prefs = vouch_core::WorkspacePreferences::default();
//!
//! let request = EvaluationRequest::new("What is the capital of France?", "Lyon")
//!     .with_evidence(["Paris is the capital of France."]);
//!
//! let checker = FactChecker::with_registry(registry.clone());
//! let decision = checker
//!     .evaluate(&request, &sources.resolve_fact_check(&FactCheckLayer::default(), &prefs))
//!     .await;
//! let answer = decision.delivered_answer(&request.draft_answer);
//!
//! let guard = ResponseGuard::with_registry(registry);
//! let delivered = guard
//!     .apply(answer, &sources.resolve_guard(&GuardLayer::default(), &prefs))
//!     .await;
//! println!("{}", delivered.text());
//! ```

pub mod fact_checker;
pub mod guard;
pub mod invoker;
pub mod providers;
pub mod settings;

pub use fact_checker::FactChecker;
pub use guard::ResponseGuard;
pub use invoker::ModelInvoker;
pub use providers::{
    CompletionConfig, CompletionResponse, LlmProvider, ProviderError, ProviderFactory,
    ProviderRegistry,
};
pub use settings::{InMemorySettingsStore, SettingsError, SettingsStore};
