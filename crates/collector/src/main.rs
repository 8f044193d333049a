//! # JTI Collector
//!
//! Recebe o stream JTI (Juniper Telemetry Interface) via UDP, decodifica
//! as extensões Optics e Port e mantém um registry de interfaces com as
//! leituras mais recentes de cada uma.
//!
//! ## Uso
//! ```bash
//! jti_collector                 # config.toml ao lado do executável
//! jti_collector /etc/jti.toml   # config explícito
//! ```

mod listener;
mod reporter;

use jti_core::config::AppConfig;
use jti_core::registry::MemoryRegistry;
use listener::JtiUdpServer;
use reporter::Reporter;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config_path = AppConfig::resolve_path();
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate_collector();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        return ExitCode::FAILURE;
    }
    let server_config = match config.collector.server_config() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // ── Registry + servidor ──
    let registry = Arc::new(MemoryRegistry::new());
    let mut server = JtiUdpServer::new(&server_config, registry.clone());

    let local = match server.connect() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Erro ao criar conexão UDP: {e}");
            return ExitCode::FAILURE;
        }
    };

    let stop = server.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Ctrl-C recebido, parando listener...");
        stop.stop();
    }) {
        warn!("Não foi possível instalar handler de Ctrl-C: {e}");
    }

    let reporter = Reporter::spawn(registry.clone(), config.collector.report_interval_secs);

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ JTI COLLECTOR – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Endereço:  {}", server_config.address);
    println!("  Socket:    {local}");
    println!("  Contexto:  {} chave(s)", server_config.context.len());
    println!("══════════════════════════════════════════════");
    println!();

    // ── Listener ──
    let listener = match std::thread::Builder::new()
        .name("jti-listener".into())
        .spawn(move || server.listen())
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Falha ao criar thread do listener: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = listener.join();

    if let Some(reporter) = reporter {
        reporter.stop();
    }
    info!(devices = registry.devices().len(), "Collector finalizado");

    match result {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!("Listener encerrado com erro: {e}");
            ExitCode::FAILURE
        }
        Err(_) => {
            error!("Thread do listener entrou em pânico");
            ExitCode::FAILURE
        }
    }
}
