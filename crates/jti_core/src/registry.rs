//! Fronteira do registry de dispositivos + implementação em memória.
//!
//! O reconciliador só conhece o trait [`DeviceRegistry`]. O
//! [`MemoryRegistry`] guarda dispositivos e leituras em memória (sem
//! persistência entre reinícios) e pode ser consultado por outras threads
//! enquanto o listener escreve.

use crate::identity::{IdentityError, device_identity};
use crate::types::Reading;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Nome do handler de leitura associado a todos os dispositivos.
pub const DEVICE_HANDLER: &str = "jti";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Dispositivo já registrado: {0}")]
    AlreadyExists(String),

    #[error("Nenhuma leitura disponível para o dispositivo {0}")]
    NotFound(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Dados para criar um dispositivo novo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    pub kind: String,
    pub tags: Vec<String>,
    pub context: BTreeMap<String, String>,
    pub id_components: HashMap<String, String>,
    pub info: String,
}

/// Dispositivo registrado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Handle interno atribuído pelo registry
    pub handle: u64,
    /// Identidade derivada dos componentes (chave de lookup)
    pub identity: String,
    pub kind: String,
    pub info: String,
    pub tags: Vec<String>,
    pub handler: String,
    /// Contexto efetivo (global + dispositivo), fixado na criação
    pub context: BTreeMap<String, String>,
    pub id_components: HashMap<String, String>,
}

/// Capacidades exigidas do armazenamento de dispositivos.
pub trait DeviceRegistry: Send + Sync {
    /// Gera a identidade usada pelo índice do registry.
    fn identity(&self, components: &HashMap<String, String>) -> Result<String, IdentityError> {
        device_identity(components)
    }

    fn get(&self, identity: &str) -> Option<Device>;

    fn create(&self, new: NewDevice) -> Result<Device, RegistryError>;

    /// Substitui o conjunto de leituras do dispositivo.
    fn set_readings(&self, identity: &str, readings: Vec<Reading>) -> Result<(), RegistryError>;

    /// Leituras anexadas mais recentemente.
    fn readings(&self, identity: &str) -> Result<Arc<Vec<Reading>>, RegistryError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    device: Device,
    readings: Option<Arc<Vec<Reading>>>,
}

/// Registry em memória, indexado pela identidade.
#[derive(Default)]
pub struct MemoryRegistry {
    devices: RwLock<HashMap<String, Entry>>,
    next_handle: AtomicU64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot dos dispositivos, ordenado por handle.
    pub fn devices(&self) -> Vec<Device> {
        let guard = self.devices.read().unwrap_or_else(|e| e.into_inner());
        let mut devices: Vec<Device> = guard.values().map(|e| e.device.clone()).collect();
        devices.sort_by_key(|d| d.handle);
        devices
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn get(&self, identity: &str) -> Option<Device> {
        let guard = self.devices.read().unwrap_or_else(|e| e.into_inner());
        guard.get(identity).map(|e| e.device.clone())
    }

    fn create(&self, new: NewDevice) -> Result<Device, RegistryError> {
        let identity = self.identity(&new.id_components)?;

        let mut guard = self.devices.write().unwrap_or_else(|e| e.into_inner());
        if guard.contains_key(&identity) {
            return Err(RegistryError::AlreadyExists(identity));
        }

        let device = Device {
            handle: self.next_handle.fetch_add(1, Ordering::Relaxed),
            identity: identity.clone(),
            kind: new.kind,
            info: new.info,
            tags: new.tags,
            handler: DEVICE_HANDLER.to_string(),
            context: new.context,
            id_components: new.id_components,
        };
        debug!(handle = device.handle, identity = %identity, "Dispositivo criado no registry");

        guard.insert(
            identity,
            Entry {
                device: device.clone(),
                readings: None,
            },
        );
        Ok(device)
    }

    fn set_readings(&self, identity: &str, readings: Vec<Reading>) -> Result<(), RegistryError> {
        let mut guard = self.devices.write().unwrap_or_else(|e| e.into_inner());
        let entry = guard
            .get_mut(identity)
            .ok_or_else(|| RegistryError::NotFound(identity.to_string()))?;
        entry.readings = Some(Arc::new(readings));
        Ok(())
    }

    fn readings(&self, identity: &str) -> Result<Arc<Vec<Reading>>, RegistryError> {
        let guard = self.devices.read().unwrap_or_else(|e| e.into_inner());
        guard
            .get(identity)
            .and_then(|e| e.readings.clone())
            .ok_or_else(|| RegistryError::NotFound(identity.to_string()))
    }

    fn len(&self) -> usize {
        self.devices.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputKind;

    fn new_device(name: &str) -> NewDevice {
        NewDevice {
            kind: "interface".into(),
            tags: vec!["networking:interface".into()],
            context: BTreeMap::from([("name".to_string(), name.to_string())]),
            id_components: HashMap::from([
                ("sys".to_string(), "r1".to_string()),
                ("if".to_string(), name.to_string()),
            ]),
            info: format!("r1 interface {name}"),
        }
    }

    #[test]
    fn create_then_get_by_identity() {
        let reg = MemoryRegistry::new();
        let dev = reg.create(new_device("et-0/0/0")).unwrap();
        assert_eq!(dev.identity, "et-0/0/0r1");
        assert_eq!(dev.handler, "jti");
        assert_eq!(reg.get("et-0/0/0r1"), Some(dev));
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn handles_are_distinct_from_identity() {
        let reg = MemoryRegistry::new();
        let a = reg.create(new_device("a")).unwrap();
        let b = reg.create(new_device("b")).unwrap();
        assert_ne!(a.handle, b.handle);
        assert_eq!(
            reg.devices().iter().map(|d| d.handle).collect::<Vec<_>>(),
            vec![a.handle, b.handle]
        );
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let reg = MemoryRegistry::new();
        reg.create(new_device("a")).unwrap();
        assert!(matches!(
            reg.create(new_device("a")),
            Err(RegistryError::AlreadyExists(_))
        ));
    }

    #[test]
    fn readings_not_found_until_attached() {
        let reg = MemoryRegistry::new();
        let dev = reg.create(new_device("a")).unwrap();
        assert!(matches!(
            reg.readings(&dev.identity),
            Err(RegistryError::NotFound(_))
        ));

        reg.set_readings(&dev.identity, vec![OutputKind::Number.reading("x", 1u64)])
            .unwrap();
        assert_eq!(reg.readings(&dev.identity).unwrap().len(), 1);

        reg.set_readings(&dev.identity, Vec::new()).unwrap();
        assert!(reg.readings(&dev.identity).unwrap().is_empty());
    }

    #[test]
    fn set_readings_on_unknown_device_fails() {
        let reg = MemoryRegistry::new();
        assert!(reg.set_readings("ghost", Vec::new()).is_err());
    }

    #[test]
    fn empty_identity_is_rejected() {
        let reg = MemoryRegistry::new();
        let mut new = new_device("a");
        new.id_components.clear();
        assert!(matches!(
            reg.create(new),
            Err(RegistryError::Identity(IdentityError::MissingIdentityData))
        ));
    }
}
