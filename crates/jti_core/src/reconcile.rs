//! Reconciliação de registros decodificados com o registry.
//!
//! Para cada registro: identidade → get → (create com contexto mesclado)
//! → substituição das leituras.

use crate::identity::IdentityError;
use crate::registry::{Device, DeviceRegistry, NewDevice, RegistryError};
use crate::types::DecodedRecord;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Falha ao registrar dispositivo '{info}': {source}")]
    Create {
        info: String,
        #[source]
        source: RegistryError,
    },

    #[error("Falha ao anexar leituras ao dispositivo {identity}: {source}")]
    Attach {
        identity: String,
        #[source]
        source: RegistryError,
    },
}

/// Mescla os contextos: o do dispositivo vence em caso de colisão.
pub fn merge_context(
    global: &BTreeMap<String, String>,
    device: &HashMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = global.clone();
    for (k, v) in device {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Liga registros decodificados a dispositivos do registry.
pub struct Reconciler {
    registry: Arc<dyn DeviceRegistry>,
    global_context: BTreeMap<String, String>,
}

impl Reconciler {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        global_context: BTreeMap<String, String>,
    ) -> Self {
        Self {
            registry,
            global_context,
        }
    }

    pub fn global_context(&self) -> &BTreeMap<String, String> {
        &self.global_context
    }

    /// Reconcilia um registro, criando o dispositivo na primeira observação.
    ///
    /// Retorna o dispositivo e se ele foi criado agora.
    pub fn reconcile(&self, record: DecodedRecord) -> Result<(Device, bool), ReconcileError> {
        let DecodedRecord {
            descriptor,
            readings,
        } = record;

        let identity = self.registry.identity(&descriptor.id_components)?;

        let (device, created) = match self.registry.get(&identity) {
            Some(device) => (device, false),
            None => {
                let new = NewDevice {
                    kind: descriptor.kind,
                    tags: descriptor.tags,
                    context: merge_context(&self.global_context, &descriptor.context),
                    id_components: descriptor.id_components,
                    info: descriptor.info,
                };
                let info = new.info.clone();
                let device = self
                    .registry
                    .create(new)
                    .map_err(|source| ReconcileError::Create { info, source })?;
                info!(
                    kind = %device.kind,
                    info = %device.info,
                    handle = device.handle,
                    "Novo dispositivo registrado"
                );
                (device, true)
            }
        };

        let count = readings.len();
        self.registry
            .set_readings(&device.identity, readings)
            .map_err(|source| ReconcileError::Attach {
                identity: device.identity.clone(),
                source,
            })?;
        debug!(identity = %device.identity, readings = count, "Leituras substituídas");

        Ok((device, created))
    }
}
