//! # JTI Core
//!
//! Decodificação do stream Juniper Telemetry Interface (GPB sobre UDP),
//! modelo normalizado de métricas e reconciliação de dispositivos.
//!
//! ## Módulos
//! - [`wire`] – Mensagens protobuf (`TelemetryStream`, Optics, Port)
//! - [`envelope`] – Parse do envelope e seleção da extensão
//! - [`extract`], [`optics`], [`port`] – Extratores por família de sensor
//! - [`decoder`] – Coordenador: bytes → registros
//! - [`identity`] – Identidade determinística de dispositivos
//! - [`registry`] – Fronteira do registry + implementação em memória
//! - [`reconcile`] – Registro → dispositivo (get/create + leituras)
//! - [`config`] – Configuração unificada via TOML

pub mod config;
pub mod decoder;
pub mod envelope;
pub mod extract;
pub mod identity;
pub mod optics;
pub mod port;
pub mod reconcile;
pub mod registry;
pub mod types;
pub mod wire;

// Re-exports convenientes
pub use config::{AppConfig, CollectorConfig, ServerConfig};
pub use decoder::{DecodeError, JtiDecoder};
pub use reconcile::{ReconcileError, Reconciler};
pub use registry::{Device, DeviceRegistry, MemoryRegistry};
pub use types::{DecodedRecord, Reading};
