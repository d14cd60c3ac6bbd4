//! Credential documents: ID cards and certificates.
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | Fixed per-kind geometry (`LayoutSpec`), pure lookup |
//! | [`subject`] | The person a document is issued to |
//! | [`calculations`] | Pure math: center-crop, text fitting, underline span |
//! | [`photo`] | Subject photo fetch/prepare, and slot rendering with placeholder fallback |
//! | [`markup`] | Zone → SVG markup via Maud |
//! | [`composer`] | Orchestrates the above and rasterizes with resvg |
//!
//! Layouts never see a subject and the composer never invents geometry: all
//! coordinates live in [`layout`], all subject values flow through
//! [`CredentialSubject::field`].

pub mod calculations;
pub mod composer;
pub mod layout;
pub mod markup;
pub mod photo;
pub mod subject;

pub use composer::{ComposeError, Composer, ComposerSettings, Document, OutputFormat};
pub use layout::{DocumentKind, LayoutError, LayoutSpec, layout_for};
pub use subject::CredentialSubject;
