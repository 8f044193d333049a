//! Decodificação do envelope `TelemetryStream`.
//!
//! Faz o parse do datagrama, copia o contexto compartilhado e identifica
//! qual extensão Juniper (se alguma) está presente.

use crate::types::SensorContext;
use crate::wire::{JuniperNetworksSensors, Optics, Port, TelemetryStream};
use prost::Message;
use tracing::debug;

/// Erros de envelope. Sempre fatais apenas para o datagrama atual.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Envelope malformado: datagrama vazio")]
    Empty,

    #[error("Envelope malformado: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Extensão de fabricante carregada pelo envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    Optics(Optics),
    Port(Port),
    /// Nenhuma extensão suportada (ou nenhuma extensão).
    Unknown,
}

impl Extension {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Optics(_) => "optics",
            Self::Port(_) => "port",
            Self::Unknown => "unknown",
        }
    }
}

/// Envelope decodificado, transitório por datagrama.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEnvelope {
    pub context: SensorContext,
    pub sequence_number: u32,
    pub timestamp_ms: u64,
    pub extension: Extension,
}

/// Decodifica bytes recebidos via UDP em um [`TelemetryEnvelope`].
pub fn decode_envelope(data: &[u8]) -> Result<TelemetryEnvelope, EnvelopeError> {
    if data.is_empty() {
        return Err(EnvelopeError::Empty);
    }

    let stream = TelemetryStream::decode(data)?;

    let context = SensorContext {
        sensor_name: stream.sensor_name.unwrap_or_default(),
        system_id: stream.system_id.unwrap_or_default(),
        component_id: stream.component_id.unwrap_or_default(),
        sub_component_id: stream.sub_component_id.unwrap_or_default(),
    };

    let extension = match stream.enterprise.and_then(|e| e.juniper_networks) {
        Some(jnpr) => select_extension(jnpr),
        None => {
            debug!("Envelope sem extensão juniperNetworks");
            Extension::Unknown
        }
    };

    Ok(TelemetryEnvelope {
        context,
        sequence_number: stream.sequence_number.unwrap_or_default(),
        timestamp_ms: stream.timestamp.unwrap_or_default(),
        extension,
    })
}

/// Optics tem prioridade quando as duas extensões aparecem juntas.
fn select_extension(jnpr: JuniperNetworksSensors) -> Extension {
    match (jnpr.jnpr_optics_ext, jnpr.jnpr_interface_ext) {
        (Some(optics), port) => {
            if port.is_some() {
                debug!("Envelope com Optics e Port; ignorando Port");
            }
            Extension::Optics(optics)
        }
        (None, Some(port)) => Extension::Port(port),
        (None, None) => Extension::Unknown,
    }
}
