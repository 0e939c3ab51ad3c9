#![deny(unsafe_code)]

//! Portmapper version 2 (RFC 1057 appendix A).
//!
//! The directory clients probe first: it maps (program, version,
//! protocol) to the fixed ports the mount and NFS services listen on.

use reef_stream::{HandlerError, RpcService};
use reef_xdr::{self as xdr, xdr_struct, Encode};
use tracing::debug;

pub const PROGRAM: u32 = 100000;
pub const VERSION: u32 = 2;

pub const PROC_NULL: u32 = 0;
pub const PROC_SET: u32 = 1;
pub const PROC_UNSET: u32 = 2;
pub const PROC_GETPORT: u32 = 3;
pub const PROC_DUMP: u32 = 4;
pub const PROC_CALLIT: u32 = 5;

pub const IPPROTO_TCP: u32 = 6;
pub const IPPROTO_UDP: u32 = 17;

pub const PORT_PORTMAP: u32 = 111;
pub const PORT_MOUNT: u32 = 892;
pub const PORT_NFS: u32 = 2049;

/// GETPORT result for a program nobody registered.
const PROGRAM_NOT_AVAILABLE: u32 = 0;

xdr_struct! {
    /// A (program, version, protocol, port) registration (RFC 1057
    /// `struct mapping`).
    pub struct Mapping {
        program: u32,
        version: u32,
        protocol: u32,
        port: u32,
    }
}

xdr_struct! {
    /// GETPORT result: the port, or 0 when unregistered.
    pub struct GetPortResult {
        port: u32,
    }
}

xdr_struct! {
    /// Node in the DUMP result list (RFC 1057 `struct pmaplist`).
    pub struct MappingNode {
        switch value_follows: u32,
        case(1) mapping: Mapping,
        next: Option<Box<MappingNode>>,
    }
}

impl MappingNode {
    pub fn end() -> Self {
        Self::default()
    }
}

/// The portmap service with its procedures registered; the caller adds
/// listeners and serves it.
pub fn service() -> RpcService {
    let mut svc = RpcService::new("portmap", PROGRAM, VERSION);
    svc.register_procedure(PROC_NULL, null);
    svc.register_procedure(PROC_GETPORT, get_port);
    svc.register_procedure(PROC_DUMP, dump);
    svc
}

/// The fixed registrations this server answers for.
pub fn registered_mappings() -> Vec<Mapping> {
    vec![
        Mapping {
            program: PROGRAM,
            version: VERSION,
            protocol: IPPROTO_TCP,
            port: PORT_PORTMAP,
        },
        Mapping {
            program: PROGRAM,
            version: VERSION,
            protocol: IPPROTO_UDP,
            port: PORT_PORTMAP,
        },
        Mapping {
            program: reef_mount::PROGRAM,
            version: reef_mount::VERSION,
            protocol: IPPROTO_TCP,
            port: PORT_MOUNT,
        },
        Mapping {
            program: reef_nfs::PROGRAM,
            version: reef_nfs::VERSION,
            protocol: IPPROTO_TCP,
            port: PORT_NFS,
        },
    ]
}

fn null(_args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    Ok(Box::new(()))
}

fn get_port(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let (mapping, _) = xdr::from_bytes::<Mapping>(args)?;
    let port = lookup_port(&mapping);
    debug!(
        program = mapping.program,
        version = mapping.version,
        protocol = mapping.protocol,
        port,
        "getport"
    );
    Ok(Box::new(GetPortResult { port }))
}

fn dump(_args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let list = registered_mappings()
        .into_iter()
        .rev()
        .fold(MappingNode::end(), |next, mapping| MappingNode {
            value_follows: 1,
            mapping,
            next: Some(Box::new(next)),
        });
    Ok(Box::new(list))
}

/// The GETPORT policy: mount answers on TCP for any version, NFS only as
/// version 3 on TCP, everything else is unregistered.
fn lookup_port(mapping: &Mapping) -> u32 {
    match (mapping.program, mapping.protocol) {
        (reef_mount::PROGRAM, IPPROTO_TCP) => PORT_MOUNT,
        (reef_nfs::PROGRAM, IPPROTO_TCP) if mapping.version == reef_nfs::VERSION => PORT_NFS,
        _ => PROGRAM_NOT_AVAILABLE,
    }
}
