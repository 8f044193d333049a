//! Servidor UDP que recebe o stream JTI e alimenta o registry.
//!
//! Estados: `Idle → Connected → Listening → Stopped`. Um datagrama por vez,
//! processado inteiro (decode, extração, reconciliação) antes do próximo.

use jti_core::config::ServerConfig;
use jti_core::decoder::JtiDecoder;
use jti_core::reconcile::{ReconcileError, Reconciler};
use jti_core::registry::DeviceRegistry;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Tamanho máximo de um datagrama UDP (64 KiB).
pub const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

/// Erros do listener.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Esquema de rede não suportado: '{0}' (use udp, udp4 ou udp6)")]
    UnsupportedScheme(String),

    #[error("Falha ao bind em {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Listener não conectado")]
    NotConnected,

    #[error("Erro ao receber UDP: {0}")]
    Read(#[source] io::Error),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Família de rede do endereço configurado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Udp,
    Udp4,
    Udp6,
}

impl Network {
    fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            Self::Udp => true,
            Self::Udp4 => addr.is_ipv4(),
            Self::Udp6 => addr.is_ipv6(),
        }
    }
}

impl FromStr for Network {
    type Err = ListenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "udp" => Ok(Self::Udp),
            "udp4" => Ok(Self::Udp4),
            "udp6" => Ok(Self::Udp6),
            other => Err(ListenerError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Separa `rede://host:porta`. Sem prefixo, usa `udp`.
pub fn parse_address(raw: &str) -> Result<(Network, &str), ListenerError> {
    match raw.split_once("://") {
        Some((scheme, address)) => Ok((scheme.parse()?, address)),
        None => Ok((Network::Udp, raw)),
    }
}

fn resolve(raw: &str) -> Result<SocketAddr, ListenerError> {
    let (network, address) = parse_address(raw)?;
    let bind_err = |source| ListenerError::Bind {
        address: raw.to_string(),
        source,
    };

    address
        .to_socket_addrs()
        .map_err(bind_err)?
        .find(|a| network.accepts(a))
        .ok_or_else(|| {
            bind_err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("nenhum endereço {network:?} encontrado"),
            ))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Connected,
    Listening,
    Stopped,
}

/// Contadores do loop de recepção.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub datagrams: u64,
    pub discarded: u64,
    pub records: u64,
    pub devices_created: u64,
}

/// Handle para parar o listener a partir de outra thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    /// Endereço de wake-up, preenchido pelo `connect`
    wake: Arc<Mutex<Option<SocketAddr>>>,
}

impl StopHandle {
    /// Sinaliza a parada e desbloqueia a leitura pendente com um
    /// datagrama vazio enviado ao próprio socket.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);

        let wake = *self.wake.lock().unwrap_or_else(|e| e.into_inner());
        let Some(target) = wake else {
            warn!("Listener ainda sem socket; parada será vista no próximo listen");
            return;
        };
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        match UdpSocket::bind(local).and_then(|s| s.send_to(&[], target)) {
            Ok(_) => debug!("Wake-up enviado para {target}"),
            Err(e) => warn!("Falha ao acordar listener em {target}: {e}"),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Endereço usado para acordar um socket: loopback se o bind foi em
/// endereço não especificado.
fn wake_address(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}

/// Servidor UDP do stream JTI.
pub struct JtiUdpServer {
    address: String,
    buffer_size: usize,
    state: ServerState,
    socket: Option<UdpSocket>,
    local_addr: Option<SocketAddr>,
    stopped: Arc<AtomicBool>,
    wake: Arc<Mutex<Option<SocketAddr>>>,
    decoder: JtiDecoder,
    reconciler: Reconciler,
    stats: ListenerStats,
}

impl JtiUdpServer {
    pub fn new(config: &ServerConfig, registry: Arc<dyn DeviceRegistry>) -> Self {
        Self {
            address: config.address.clone(),
            buffer_size: MAX_DATAGRAM_SIZE,
            state: ServerState::Idle,
            socket: None,
            local_addr: None,
            stopped: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Mutex::new(None)),
            decoder: JtiDecoder::new(registry.clone()),
            reconciler: Reconciler::new(registry, config.context.clone()),
            stats: ListenerStats::default(),
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Cria o socket. Chamadas repetidas não fazem nada.
    pub fn connect(&mut self) -> Result<SocketAddr, ListenerError> {
        if let (Some(_), Some(addr)) = (&self.socket, self.local_addr) {
            debug!("Servidor UDP já conectado em {addr}");
            return Ok(addr);
        }

        let addr = resolve(&self.address)?;
        let socket = UdpSocket::bind(addr).map_err(|source| ListenerError::Bind {
            address: self.address.clone(),
            source,
        })?;
        let local = socket.local_addr().map_err(|source| ListenerError::Bind {
            address: self.address.clone(),
            source,
        })?;

        self.socket = Some(socket);
        self.local_addr = Some(local);
        *self.wake.lock().unwrap_or_else(|e| e.into_inner()) = Some(wake_address(local));
        self.state = ServerState::Connected;
        info!("Servidor UDP conectado em {local}");
        Ok(local)
    }

    /// Handle de parada. Pode ser obtido antes do [`connect`](Self::connect):
    /// o endereço de wake-up é lido no momento do `stop`.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stopped: self.stopped.clone(),
            wake: self.wake.clone(),
        }
    }

    /// Para o servidor e fecha o socket.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.socket = None;
        self.state = ServerState::Stopped;
    }

    /// Loop de recepção. Retorna `Ok(())` em parada solicitada.
    ///
    /// Erros de decode descartam o datagrama; erros de reconciliação e de
    /// leitura encerram o loop.
    pub fn listen(&mut self) -> Result<(), ListenerError> {
        if self.stopped.load(Ordering::SeqCst) {
            self.state = ServerState::Stopped;
            return Ok(());
        }

        self.connect().inspect_err(|e| error!("Erro ao criar conexão UDP: {e}"))?;
        let socket = self.socket.take().ok_or(ListenerError::NotConnected)?;
        self.state = ServerState::Listening;

        info!(
            address = %self.address,
            buffer = self.buffer_size,
            "Escutando stream JTI..."
        );

        let mut buf = vec![0u8; self.buffer_size];
        let result = loop {
            if self.stopped.load(Ordering::SeqCst) {
                break Ok(());
            }

            match socket.recv_from(&mut buf) {
                Ok((size, source)) => {
                    if self.stopped.load(Ordering::SeqCst) {
                        break Ok(());
                    }
                    if let Err(e) = self.handle_datagram(&buf[..size], source) {
                        break Err(e);
                    }
                }
                Err(_) if self.stopped.load(Ordering::SeqCst) => break Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Erro ao receber UDP: {e}");
                    break Err(ListenerError::Read(e));
                }
            }
        };

        drop(socket);
        self.state = ServerState::Stopped;
        let s = self.stats;
        info!(
            datagrams = s.datagrams,
            discarded = s.discarded,
            records = s.records,
            devices_created = s.devices_created,
            "Listener JTI finalizado"
        );
        result
    }

    fn handle_datagram(&mut self, data: &[u8], source: SocketAddr) -> Result<(), ListenerError> {
        self.stats.datagrams += 1;

        let records = match self.decoder.decode(data) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Falha ao decodificar payload de {source} ({} bytes), descartando: {e}",
                    data.len()
                );
                self.stats.discarded += 1;
                return Ok(());
            }
        };

        for record in records {
            let (_, created) = self
                .reconciler
                .reconcile(record)
                .inspect_err(|e| error!("Falha ao reconciliar dispositivo: {e}"))?;
            self.stats.records += 1;
            if created {
                self.stats.devices_created += 1;
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use jti_core::registry::{Device, MemoryRegistry, NewDevice, RegistryError};
    use jti_core::types::{Reading, ReadingValue};
    use jti_core::wire::*;
    use prost::Message;
    use std::collections::BTreeMap;
    use std::thread;
    use std::time::{Duration, Instant};

    fn config(address: &str) -> ServerConfig {
        ServerConfig {
            address: address.into(),
            context: BTreeMap::from([("site".to_string(), "test".to_string())]),
        }
    }

    fn header() -> StreamHeader {
        StreamHeader {
            system_id: "mx960".into(),
            component_id: 1,
            sensor_name: "jti".into(),
            ..Default::default()
        }
    }

    fn port_datagram(name: &str, octets: u64) -> Vec<u8> {
        encode_port_stream(
            header(),
            Port {
                interface_stats: vec![InterfaceInfos {
                    if_name: Some(name.into()),
                    ingress_stats: Some(InterfaceStats {
                        if_octets: Some(octets),
                        ..Default::default()
                    }),
                    ingress_queue_info: vec![QueueStats::default()],
                    ..Default::default()
                }],
            },
        )
    }

    fn optics_datagram(name: &str, lanes: usize) -> Vec<u8> {
        encode_optics_stream(
            header(),
            Optics {
                optics_diag: vec![OpticsInfos {
                    if_name: Some(name.into()),
                    optics_diag_stats: Some(OpticsDiagStats {
                        optics_lane_diag_stats: vec![OpticsDiagLaneStats::default(); lanes],
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
            },
        )
    }

    fn unknown_datagram() -> Vec<u8> {
        TelemetryStream {
            system_id: Some("mx960".into()),
            enterprise: Some(EnterpriseSensors::default()),
            ..Default::default()
        }
        .encode_to_vec()
    }

    fn send(target: SocketAddr, data: &[u8]) {
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.send_to(data, target).unwrap();
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    fn ingress_octets(readings: &[Reading]) -> Option<ReadingValue> {
        readings
            .iter()
            .find(|r| r.name == "if_octets" && r.context_value("direction") == Some("ingress"))
            .map(|r| r.value.clone())
    }

    /// Registry que recusa qualquer criação.
    struct RejectingRegistry;

    impl DeviceRegistry for RejectingRegistry {
        fn get(&self, _: &str) -> Option<Device> {
            None
        }
        fn create(&self, _: NewDevice) -> Result<Device, RegistryError> {
            Err(RegistryError::AlreadyExists("stub".into()))
        }
        fn set_readings(&self, id: &str, _: Vec<Reading>) -> Result<(), RegistryError> {
            Err(RegistryError::NotFound(id.into()))
        }
        fn readings(&self, id: &str) -> Result<Arc<Vec<Reading>>, RegistryError> {
            Err(RegistryError::NotFound(id.into()))
        }
        fn len(&self) -> usize {
            0
        }
    }

    #[test]
    fn parses_network_prefix() {
        assert_eq!(
            parse_address("localhost:21000").unwrap(),
            (Network::Udp, "localhost:21000")
        );
        assert_eq!(
            parse_address("udp4://1.2.3.4:30000").unwrap(),
            (Network::Udp4, "1.2.3.4:30000")
        );
        assert_eq!(
            parse_address("udp6://[::1]:30000").unwrap(),
            (Network::Udp6, "[::1]:30000")
        );
        assert!(matches!(
            parse_address("tcp://1.2.3.4:30000"),
            Err(ListenerError::UnsupportedScheme(s)) if s == "tcp"
        ));
    }

    #[test]
    fn new_server_is_idle() {
        let server = JtiUdpServer::new(&config("localhost"), Arc::new(MemoryRegistry::new()));
        assert_eq!(server.state(), ServerState::Idle);
        assert_eq!(server.buffer_size, 64 * 1024);
        assert!(server.local_addr().is_none());
        assert_eq!(server.reconciler.global_context()["site"], "test");
        assert!(server.decoder.is_configured());
    }

    #[test]
    fn connect_is_reentrant() {
        let mut server =
            JtiUdpServer::new(&config("udp://127.0.0.1:0"), Arc::new(MemoryRegistry::new()));
        let first = server.connect().unwrap();
        let second = server.connect().unwrap();
        assert_eq!(first, second);
        assert_eq!(server.state(), ServerState::Connected);
    }

    #[test]
    fn bind_errors() {
        let registry: Arc<dyn DeviceRegistry> = Arc::new(MemoryRegistry::new());

        let mut server = JtiUdpServer::new(&config("localhost"), registry.clone());
        assert!(matches!(server.connect(), Err(ListenerError::Bind { .. })));

        let mut server = JtiUdpServer::new(&config("tcp://127.0.0.1:0"), registry.clone());
        assert!(matches!(
            server.connect(),
            Err(ListenerError::UnsupportedScheme(_))
        ));

        let mut server = JtiUdpServer::new(&config("udp6://127.0.0.1:0"), registry);
        assert!(matches!(server.connect(), Err(ListenerError::Bind { .. })));
        assert_eq!(server.state(), ServerState::Idle);
    }

    #[test]
    fn stop_without_connection() {
        let mut server = JtiUdpServer::new(&config("localhost"), Arc::new(MemoryRegistry::new()));
        let handle = server.stop_handle();
        handle.stop();
        assert!(handle.is_stopped());
        server.stop();
        assert_eq!(server.state(), ServerState::Stopped);
        // Listen depois de stop retorna imediatamente
        assert!(server.listen().is_ok());
    }

    #[test]
    fn wake_address_uses_loopback() {
        let addr: SocketAddr = "0.0.0.0:4000".parse().unwrap();
        assert_eq!(wake_address(addr), "127.0.0.1:4000".parse().unwrap());
        let addr: SocketAddr = "[::]:4000".parse().unwrap();
        assert_eq!(wake_address(addr), "[::1]:4000".parse().unwrap());
        let addr: SocketAddr = "10.0.0.1:4000".parse().unwrap();
        assert_eq!(wake_address(addr), addr);
    }

    #[test]
    fn stream_end_to_end() {
        let registry = Arc::new(MemoryRegistry::new());
        let mut server = JtiUdpServer::new(&config("udp://127.0.0.1:0"), registry.clone());
        let addr = server.connect().unwrap();
        let stop = server.stop_handle();

        let worker = thread::spawn(move || {
            let result = server.listen();
            (result, server.stats(), server.state())
        });

        // Ruído: extensão desconhecida, lixo e datagrama vazio
        send(addr, &unknown_datagram());
        send(addr, &[0x0A, 0x20, 0x41]);
        send(addr, &[]);
        send(addr, &port_datagram("et-0/0/0", 100));
        send(addr, &optics_datagram("et-0/0/1", 4));
        send(addr, &port_datagram("et-0/0/0", 250));

        let port_id = "1et-0/0/00mx960";
        let optics_id = "1et-0/0/10mx960";
        assert!(wait_until(|| {
            registry
                .readings(port_id)
                .map(|r| ingress_octets(&r) == Some(ReadingValue::Uint(250)))
                .unwrap_or(false)
                && registry.readings(optics_id).is_ok()
        }));

        stop.stop();
        let (result, stats, state) = worker.join().unwrap();
        assert!(result.is_ok());
        assert_eq!(state, ServerState::Stopped);
        // Lixo e datagrama vazio sem pedido de parada são descartados
        assert_eq!(stats.discarded, 2);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.devices_created, 2);

        assert_eq!(registry.len(), 2);
        let port_readings = registry.readings(port_id).unwrap();
        assert_eq!(port_readings.len(), 39 + 11);
        let optics_readings = registry.readings(optics_id).unwrap();
        assert_eq!(optics_readings.len(), 22 + 19 * 4);

        let device = registry.get(port_id).unwrap();
        assert_eq!(device.context["site"], "test");
        assert_eq!(device.context["name"], "et-0/0/0");
        assert_eq!(device.info, "mx960 interface et-0/0/0");
    }

    #[test]
    fn reconcile_failure_stops_loop() {
        let mut server =
            JtiUdpServer::new(&config("udp://127.0.0.1:0"), Arc::new(RejectingRegistry));
        let addr = server.connect().unwrap();

        let worker = thread::spawn(move || server.listen());

        send(addr, &unknown_datagram());
        send(addr, &port_datagram("et-0/0/0", 1));

        let result = worker.join().unwrap();
        assert!(matches!(result, Err(ListenerError::Reconcile(_))));
    }

    #[test]
    fn stop_unblocks_idle_listener() {
        let mut server =
            JtiUdpServer::new(&config("udp://127.0.0.1:0"), Arc::new(MemoryRegistry::new()));
        server.connect().unwrap();
        let stop = server.stop_handle();

        let worker = thread::spawn(move || server.listen());
        thread::sleep(Duration::from_millis(50));
        stop.stop();

        assert!(worker.join().unwrap().is_ok());
    }

    #[test]
    fn stop_handle_taken_before_connect() {
        let mut server =
            JtiUdpServer::new(&config("udp://127.0.0.1:0"), Arc::new(MemoryRegistry::new()));
        let stop = server.stop_handle();
        server.connect().unwrap();

        let worker = thread::spawn(move || server.listen());
        thread::sleep(Duration::from_millis(50));
        stop.stop();

        assert!(worker.join().unwrap().is_ok());
    }
}
