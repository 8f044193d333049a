//! Coordenador de decodificação.
//!
//! Envelope → extensão → extrator → registros. Não toca no registry além
//! de validar que cada registro produz uma identidade.

use crate::envelope::{EnvelopeError, Extension, decode_envelope};
use crate::extract::{ExtractionError, SensorExtractor};
use crate::identity::{IdentityError, check_same_shape};
use crate::optics::OpticsExtractor;
use crate::port::PortExtractor;
use crate::registry::DeviceRegistry;
use crate::types::DecodedRecord;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Decoder JTI sem registry configurado")]
    NotConfigured,

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Decodifica datagramas JTI em registros de dispositivo.
#[derive(Default, Clone)]
pub struct JtiDecoder {
    registry: Option<Arc<dyn DeviceRegistry>>,
    optics: OpticsExtractor,
    port: PortExtractor,
}

impl JtiDecoder {
    pub fn new(registry: Arc<dyn DeviceRegistry>) -> Self {
        Self {
            registry: Some(registry),
            ..Default::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        self.registry.is_some()
    }

    /// Decodifica um datagrama.
    ///
    /// Extensão desconhecida retorna sequência vazia (não é erro).
    pub fn decode(&self, data: &[u8]) -> Result<Vec<DecodedRecord>, DecodeError> {
        let registry = self.registry.as_ref().ok_or(DecodeError::NotConfigured)?;

        let envelope = decode_envelope(data)?;
        let ctx = &envelope.context;
        debug!(
            family = envelope.extension.kind(),
            system_id = %ctx.system_id,
            sequence = envelope.sequence_number,
            timestamp_ms = envelope.timestamp_ms,
            "Envelope decodificado"
        );

        let result = match &envelope.extension {
            Extension::Optics(optics) => self.optics.extract(ctx, Some(optics)),
            Extension::Port(port) => self.port.extract(ctx, Some(port)),
            Extension::Unknown => {
                info!(
                    system_id = %ctx.system_id,
                    sensor = %ctx.sensor_name,
                    "Mensagem com extensão não suportada, ignorando"
                );
                return Ok(Vec::new());
            }
        };

        let records = result.inspect_err(|e| {
            warn!(
                family = envelope.extension.kind(),
                system_id = %ctx.system_id,
                sensor = %ctx.sensor_name,
                component_id = ctx.component_id,
                sub_component_id = ctx.sub_component_id,
                "Falha ao extrair registros: {e}"
            );
        })?;

        check_same_shape(records.iter().map(|r| &r.descriptor.id_components))?;
        for record in &records {
            registry.identity(&record.descriptor.id_components)?;
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;
    use crate::wire::*;
    use prost::Message;

    fn decoder() -> JtiDecoder {
        JtiDecoder::new(Arc::new(MemoryRegistry::new()))
    }

    fn header() -> StreamHeader {
        StreamHeader {
            system_id: "mx960".into(),
            component_id: 1,
            sensor_name: "jti".into(),
            ..Default::default()
        }
    }

    #[test]
    fn unconfigured_decoder_fails() {
        let decoder = JtiDecoder::default();
        assert!(!decoder.is_configured());
        let bytes = encode_port_stream(header(), Port::default());
        assert!(matches!(decoder.decode(&bytes), Err(DecodeError::NotConfigured)));
        assert!(matches!(decoder.decode(&[]), Err(DecodeError::NotConfigured)));
    }

    #[test]
    fn malformed_bytes_fail() {
        assert!(matches!(
            decoder().decode(&[]),
            Err(DecodeError::Envelope(EnvelopeError::Empty))
        ));
        assert!(matches!(
            decoder().decode(&[0x0A, 0x20, 0x41]),
            Err(DecodeError::Envelope(_))
        ));
    }

    #[test]
    fn unknown_extension_is_empty() {
        let stream = TelemetryStream {
            system_id: Some("mx960".into()),
            enterprise: Some(EnterpriseSensors {
                juniper_networks: Some(JuniperNetworksSensors::default()),
            }),
            ..Default::default()
        };
        let records = decoder().decode(&stream.encode_to_vec()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn routes_optics_payload() {
        let optics = Optics {
            optics_diag: vec![OpticsInfos {
                if_name: Some("et-0/0/0".into()),
                optics_diag_stats: Some(OpticsDiagStats {
                    optics_lane_diag_stats: vec![OpticsDiagLaneStats::default(); 4],
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };
        let records = decoder()
            .decode(&encode_optics_stream(header(), optics))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].readings.len(), 22 + 19 * 4);
        assert_eq!(records[0].descriptor.info, "mx960 interface et-0/0/0");
    }

    #[test]
    fn routes_port_payload() {
        let port = Port {
            interface_stats: vec![
                InterfaceInfos {
                    if_name: Some("et-0/0/0".into()),
                    ingress_queue_info: vec![QueueStats::default(); 2],
                    egress_queue_info: vec![QueueStats::default(); 3],
                    ..Default::default()
                },
                InterfaceInfos {
                    if_name: Some("et-0/0/1".into()),
                    ..Default::default()
                },
            ],
        };
        let records = decoder().decode(&encode_port_stream(header(), port)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].readings.len(), 39 + 11 * 5);
        assert_eq!(records[1].readings.len(), 39);
    }

    #[test]
    fn extraction_errors_propagate() {
        let port = Port {
            interface_stats: vec![InterfaceInfos::default()],
        };
        let err = decoder()
            .decode(&encode_port_stream(header(), port))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Extraction(ExtractionError::MissingInterfaceName { .. })
        ));

        let header = StreamHeader {
            system_id: String::new(),
            ..header()
        };
        let port = Port {
            interface_stats: vec![InterfaceInfos {
                if_name: Some("et-0/0/0".into()),
                ..Default::default()
            }],
        };
        let err = decoder()
            .decode(&encode_port_stream(header, port))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Extraction(ExtractionError::MissingSystemId { .. })
        ));
    }
}
