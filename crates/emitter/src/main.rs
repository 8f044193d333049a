//! # JTI Emitter
//!
//! Gera um stream JTI sintético (Optics + Port) e envia via UDP para um
//! collector. Útil para smoke tests sem um roteador real.
//!
//! ## Uso
//! ```bash
//! jti_emitter                 # config.toml ao lado do executável
//! jti_emitter /etc/jti.toml   # config explícito
//! ```

mod synth;

use jti_core::config::AppConfig;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use synth::StreamSynth;
use tracing::{debug, error, info, warn};

/// Resolve `udp://host:porta` (ou `udp4://`, `udp6://`, sem prefixo).
fn resolve_dest(dest: &str) -> Result<SocketAddr, String> {
    let (scheme, address) = dest.split_once("://").unwrap_or(("udp", dest));
    let want_v4 = match scheme {
        "udp" => None,
        "udp4" => Some(true),
        "udp6" => Some(false),
        other => return Err(format!("Esquema de rede não suportado: '{other}'")),
    };

    address
        .to_socket_addrs()
        .map_err(|e| format!("Falha ao resolver {dest}: {e}"))?
        .find(|a| want_v4.is_none_or(|v4| a.is_ipv4() == v4))
        .ok_or_else(|| format!("Nenhum endereço compatível para {dest}"))
}

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = AppConfig::resolve_path();
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate_emitter();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        return ExitCode::FAILURE;
    }

    let emitter_cfg = &config.emitter;
    let interval = match Duration::try_from_secs_f64(emitter_cfg.interval_secs) {
        Ok(d) => d,
        Err(e) => {
            error!("Intervalo do emitter inválido: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dest_addr = match resolve_dest(&emitter_cfg.dest) {
        Ok(addr) => addr,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // ── Socket UDP ──
    let bind = if dest_addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let sock = match UdpSocket::bind(bind) {
        Ok(s) => s,
        Err(e) => {
            error!("Falha ao criar socket UDP: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut synth = StreamSynth::new(emitter_cfg);

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ JTI EMITTER – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Destino:    {dest_addr}");
    println!("  Intervalo:  {:.1}s", emitter_cfg.interval_secs);
    println!("  System ID:  {}", emitter_cfg.system_id);
    println!("  Interfaces: {}", emitter_cfg.interfaces.join(", "));
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    loop {
        let cycle_start = Instant::now();

        let (optics, port) = synth.next_cycle();
        let mut sent = 0;
        for (kind, frame) in [("optics", &optics), ("port", &port)] {
            match sock.send_to(frame, dest_addr) {
                Ok(n) => {
                    debug!("→ {kind}: {n} bytes para {dest_addr}");
                    sent += n;
                }
                Err(e) => error!("Erro ao enviar UDP ({kind}): {e}"),
            }
        }
        info!(
            cycle = synth.cycle(),
            bytes = sent,
            "→ Ciclo enviado para {dest_addr}"
        );

        // Dormir pelo tempo restante do intervalo
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }
}
