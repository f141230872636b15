//! Netway Contact Form Library
//!
//! Logic core of the Netway Fibra contact/registration form: input masks,
//! the ViaCEP and CNPJá lookups that auto-fill address and company fields,
//! the form session controller and the webhook submission.
//!
//! # Modules
//!
//! - `api`: HTTP host surface.
//! - `core`: Form logic (formatters, models, controller).
//! - `integrations`: External service clients.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `form_controller`: Form session state and field-change wiring.
//! - `formatters`: CEP, phone and CNPJ input masks.
//! - `handlers`: HTTP request handlers.
//! - `models`: Records, field keys and lookup models.
//! - `services`: ViaCEP and CNPJá clients.
//! - `submission`: Submit flow and phase transitions.
//! - `submission_client`: Webhook client and payload.

pub mod api;
pub mod core;
pub mod integrations;

pub mod config;
pub mod errors;
pub mod form_controller;
pub mod formatters;
pub mod handlers;
pub mod models;
pub mod services;
pub mod submission;
pub mod submission_client;
