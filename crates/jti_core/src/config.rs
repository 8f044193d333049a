//! Configuração unificada via TOML.
//!
//! Um único `config.toml` com uma seção por binário (`[collector]`,
//! `[emitter]`). O listener recebe um [`ServerConfig`] imutável, validado
//! antes de ser construído.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Maior intervalo de resumo aceito (1 dia).
pub const MAX_REPORT_INTERVAL_SECS: f64 = 86_400.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuração do collector não define o endereço ('address') obrigatório")]
    MissingAddress,

    #[error("Erro ao ler {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Erro ao parsear configuração: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuração do servidor UDP, já validada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Endereço com prefixo opcional de rede: `udp://`, `udp4://`, `udp6://`
    pub address: String,
    /// Contexto global aplicado a todos os dispositivos
    pub context: BTreeMap<String, String>,
}

/// Configuração do Collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Endereço de escuta (ex: "udp://0.0.0.0:21000"); obrigatório
    pub address: String,
    /// Contexto global (ex: site, rack)
    pub context: BTreeMap<String, String>,
    /// Intervalo do resumo periódico do registry em segundos (0 = desligado)
    pub report_interval_secs: f64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            context: BTreeMap::new(),
            report_interval_secs: 30.0,
        }
    }
}

impl CollectorConfig {
    /// Produz o [`ServerConfig`] consumido pelo listener.
    pub fn server_config(&self) -> Result<ServerConfig, ConfigError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(ConfigError::MissingAddress);
        }
        Ok(ServerConfig {
            address: address.to_string(),
            context: self.context.clone(),
        })
    }
}

/// Configuração do Emitter (gerador de stream sintético).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Destino dos datagramas
    pub dest: String,
    /// Intervalo entre ciclos em segundos
    pub interval_secs: f64,
    /// System ID anunciado nos envelopes
    pub system_id: String,
    /// Interfaces reportadas (Optics e Port)
    pub interfaces: Vec<String>,
    /// Lanes por transceiver
    pub lanes: u32,
    /// Filas por direção
    pub queues: u32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            dest: "udp://127.0.0.1:21000".into(),
            interval_secs: 1.0,
            system_id: "mx960-lab".into(),
            interfaces: vec!["et-0/0/0".into(), "et-0/0/1".into()],
            lanes: 4,
            queues: 2,
        }
    }
}

/// Configuração raiz (unifica collector e emitter).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub collector: CollectorConfig,
    pub emitter: EmitterConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML, com fallback para o padrão.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match Self::try_load(path) {
                Ok(config) => {
                    info!("Configuração carregada de {}", path.display());
                    return config;
                }
                Err(e) => warn!("{e}"),
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Carrega sem fallback.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Caminho do config: primeiro argumento da linha de comando, ou
    /// `config.toml` ao lado do executável.
    pub fn resolve_path() -> PathBuf {
        std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path)
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração do collector.
    pub fn validate_collector(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = self.collector.server_config() {
            errors.push(e.to_string());
        }
        let report = self.collector.report_interval_secs;
        if !(0.0..=MAX_REPORT_INTERVAL_SECS).contains(&report) {
            errors.push(format!(
                "Intervalo de resumo inválido: {report} (0–{MAX_REPORT_INTERVAL_SECS})"
            ));
        }

        errors
    }

    /// Valida a configuração do emitter.
    pub fn validate_emitter(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let emitter = &self.emitter;

        if emitter.dest.trim().is_empty() {
            errors.push("Destino do emitter não pode ser vazio".into());
        }
        if !(0.05..=60.0).contains(&emitter.interval_secs) {
            errors.push(format!(
                "Intervalo do emitter inválido: {} (0.05–60.0)",
                emitter.interval_secs
            ));
        }
        if emitter.system_id.is_empty() {
            errors.push("System ID do emitter não pode ser vazio".into());
        }
        if emitter.interfaces.iter().any(|i| i.is_empty()) {
            errors.push("Nome de interface vazio na lista do emitter".into());
        }

        errors
    }
}
