//! Thread de resumo periódico do registry.

use crossbeam_channel::{Sender, bounded, select, tick};
use jti_core::registry::{DeviceRegistry, MemoryRegistry};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

/// Fotografia do registry num instante.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySummary {
    pub devices: usize,
    /// Dispositivos que já têm leituras anexadas
    pub reporting: usize,
    pub readings: usize,
    pub by_kind: BTreeMap<String, usize>,
    /// Leituras por tipo semântico do output (counter, power, ...)
    pub by_type: BTreeMap<&'static str, usize>,
}

pub fn summarize(registry: &MemoryRegistry) -> RegistrySummary {
    let mut summary = RegistrySummary::default();
    for device in registry.devices() {
        summary.devices += 1;
        *summary.by_kind.entry(device.kind.clone()).or_default() += 1;
        if let Ok(readings) = registry.readings(&device.identity) {
            summary.reporting += 1;
            summary.readings += readings.len();
            for r in readings.iter() {
                *summary.by_type.entry(r.kind.type_name()).or_default() += 1;
            }
        }
    }
    summary
}

/// Loga, em debug, as leituras atuais de cada dispositivo.
fn log_devices(registry: &MemoryRegistry) {
    for device in registry.devices() {
        let Ok(readings) = registry.readings(&device.identity) else {
            continue;
        };
        let rendered: Vec<String> = readings.iter().map(ToString::to_string).collect();
        debug!(
            handle = device.handle,
            handler = %device.handler,
            info = %device.info,
            "{}",
            rendered.join(", ")
        );
    }
}

/// Reporter rodando em background.
pub struct Reporter {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl Reporter {
    /// Inicia a thread. Retorna `None` para intervalo zero ou fora do
    /// intervalo representável por [`Duration`].
    pub fn spawn(registry: Arc<MemoryRegistry>, interval_secs: f64) -> Option<Self> {
        let interval = Duration::try_from_secs_f64(interval_secs).ok()?;
        if interval.is_zero() {
            return None;
        }
        let ticker = tick(interval);
        let (shutdown, done) = bounded::<()>(1);

        let handle = std::thread::Builder::new()
            .name("jti-reporter".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            let s = summarize(&registry);
                            info!(
                                devices = s.devices,
                                reporting = s.reporting,
                                readings = s.readings,
                                kinds = ?s.by_kind,
                                types = ?s.by_type,
                                "Resumo do registry"
                            );
                            if tracing::enabled!(tracing::Level::DEBUG) {
                                log_devices(&registry);
                            }
                        }
                        recv(done) -> _ => break,
                    }
                }
            })
            .ok()?;

        Some(Self { shutdown, handle })
    }

    pub fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.join();
    }
}
