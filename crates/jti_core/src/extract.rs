//! Capacidade comum dos extratores de sensores.
//!
//! Cada família (Optics, Port) transforma o payload da sua extensão em
//! uma sequência de [`DecodedRecord`]. Campos-folha ausentes viram leituras
//! zeradas; só as pré-condições de identidade podem falhar.

use crate::types::{DecodedRecord, DeviceDescriptor, SensorContext};
use std::collections::HashMap;

/// Tipo de dispositivo emitido pelas duas famílias.
pub const INTERFACE_KIND: &str = "interface";

/// Tag de classificação de interfaces de rede.
pub const INTERFACE_TAG: &str = "networking:interface";

/// Falhas de pré-condição de identidade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("Contexto do sensor '{sensor}' sem system ID")]
    MissingSystemId { sensor: String },

    #[error("Bloco de {family} sem nome de interface (sistema {system_id})")]
    MissingInterfaceName {
        family: &'static str,
        system_id: String,
    },
}

/// Extrator de uma família de sensores.
pub trait SensorExtractor {
    /// Payload decodificado da extensão.
    type Payload;
    /// Bloco repetido do payload (um por entidade física).
    type Block;

    /// Nome da família, usado em logs e erros.
    fn family(&self) -> &'static str;

    /// Blocos do payload, na ordem do fio.
    fn blocks<'a>(&self, payload: &'a Self::Payload) -> &'a [Self::Block];

    /// Converte um único bloco em um registro.
    fn extract_block(
        &self,
        ctx: &SensorContext,
        block: &Self::Block,
    ) -> Result<DecodedRecord, ExtractionError>;

    /// Extrai todos os blocos. Payload ausente resulta em sequência vazia.
    fn extract(
        &self,
        ctx: &SensorContext,
        payload: Option<&Self::Payload>,
    ) -> Result<Vec<DecodedRecord>, ExtractionError> {
        let Some(payload) = payload else {
            tracing::info!("Payload {} ausente, nada a coletar", self.family());
            return Ok(Vec::new());
        };

        self.blocks(payload)
            .iter()
            .map(|block| self.extract_block(ctx, block))
            .collect()
    }
}

/// Descritor de interface comum a Optics e Port.
pub(crate) fn interface_descriptor(
    family: &'static str,
    ctx: &SensorContext,
    if_name: Option<&str>,
) -> Result<DeviceDescriptor, ExtractionError> {
    if ctx.system_id.is_empty() {
        return Err(ExtractionError::MissingSystemId {
            sensor: ctx.sensor_name.clone(),
        });
    }

    let name = match if_name {
        Some(name) if !name.is_empty() => name,
        _ => {
            return Err(ExtractionError::MissingInterfaceName {
                family,
                system_id: ctx.system_id.clone(),
            });
        }
    };

    let context = HashMap::from([
        ("component_id".to_string(), ctx.component_id.to_string()),
        ("name".to_string(), name.to_string()),
        ("system_id".to_string(), ctx.system_id.clone()),
        ("sensor_name".to_string(), ctx.sensor_name.clone()),
    ]);

    let id_components = HashMap::from([
        ("sys".to_string(), ctx.system_id.clone()),
        ("if".to_string(), name.to_string()),
        ("cid".to_string(), ctx.component_id.to_string()),
        ("scid".to_string(), ctx.sub_component_id.to_string()),
    ]);

    Ok(DeviceDescriptor {
        kind: INTERFACE_KIND.to_string(),
        info: format!("{} interface {}", ctx.system_id, name),
        tags: vec![INTERFACE_TAG.to_string()],
        context,
        id_components,
    })
}
