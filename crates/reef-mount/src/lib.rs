#![deny(unsafe_code)]

//! MOUNT version 3 (RFC 1813 appendix I).
//!
//! Hands out the root file handle for the demo export. NFSv3 clients call
//! MNT here before talking to the NFS service proper.

use reef_stream::{HandlerError, RpcService};
use reef_wire::AUTH_UNIX;
use reef_xdr::{self as xdr, xdr_struct, Encode};
use tracing::debug;

pub const PROGRAM: u32 = 100005;
pub const VERSION: u32 = 3;

pub const PROC_NULL: u32 = 0;
pub const PROC_MNT: u32 = 1;
pub const PROC_DUMP: u32 = 2;
pub const PROC_UMNT: u32 = 3;
pub const PROC_UMNTALL: u32 = 4;
pub const PROC_EXPORT: u32 = 5;

/// Mount status codes (RFC 1813 `enum mountstat3`).
pub const MNT3_OK: u32 = 0;
pub const MNT3ERR_PERM: u32 = 1;
pub const MNT3ERR_NOENT: u32 = 2;
pub const MNT3ERR_IO: u32 = 5;
pub const MNT3ERR_ACCES: u32 = 13;
pub const MNT3ERR_NOTDIR: u32 = 20;
pub const MNT3ERR_INVAL: u32 = 22;
pub const MNT3ERR_NAMETOOLONG: u32 = 63;
pub const MNT3ERR_NOTSUPP: u32 = 10004;
pub const MNT3ERR_SERVERFAULT: u32 = 10006;

/// Longest dirpath a client may send (RFC 1813 MNTPATHLEN).
pub const MNTPATHLEN: usize = 1024;

/// The single directory this server exports.
pub const EXPORT_PATH: &str = "/volume1/Public";

/// Every client group may mount the export.
const EXPORT_GROUP: &str = "*";

/// Root file handle handed out by MNT; NFS procedures accept it back.
pub const ROOT_FILE_HANDLE: [u8; 4] = [0x00, 0x00, 0x00, 0x2A];

xdr_struct! {
    /// Payload of a successful MNT (RFC 1813 `struct mountres3_ok`).
    pub struct MountResOk {
        file_handle: Vec<u8>,
        auth_flavors: Vec<u32>,
    }
}

xdr_struct! {
    /// MNT result union (RFC 1813 `struct mountres3`); failures carry
    /// only the status.
    pub struct MountRes {
        switch status: u32,
        case(0) mount_info: MountResOk,
    }
}

xdr_struct! {
    /// Node in a group list (RFC 1813 `struct groupnode`).
    pub struct GroupNode {
        switch value_follows: u32,
        case(1) name: String,
        next: Option<Box<GroupNode>>,
    }
}

xdr_struct! {
    /// Node in the EXPORT result list (RFC 1813 `struct exportnode`).
    pub struct ExportNode {
        switch value_follows: u32,
        case(1) directory: String,
        groups: GroupNode,
        next: Option<Box<ExportNode>>,
    }
}

impl GroupNode {
    pub fn end() -> Self {
        Self::default()
    }
}

impl ExportNode {
    pub fn end() -> Self {
        Self::default()
    }
}

/// The mount service with its procedures registered; the caller adds
/// listeners and serves it.
pub fn service() -> RpcService {
    let mut svc = RpcService::new("mount", PROGRAM, VERSION);
    svc.register_procedure(PROC_NULL, null);
    svc.register_procedure(PROC_MNT, mnt);
    svc.register_procedure(PROC_UMNT, umnt);
    svc.register_procedure(PROC_EXPORT, export);
    svc
}

fn null(_args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    Ok(Box::new(()))
}

/// MNT: map a dirpath to a file handle. Any path is accepted; the reply
/// always carries the demo export's root handle.
fn mnt(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let mut dec = xdr::Decoder::new(args);
    let dirpath = dec
        .take_opaque_bounded(MNTPATHLEN)
        .map_err(HandlerError::Garbage)?;
    debug!(dirpath = %String::from_utf8_lossy(dirpath), "mnt");

    Ok(Box::new(MountRes {
        status: MNT3_OK,
        mount_info: MountResOk {
            file_handle: ROOT_FILE_HANDLE.to_vec(),
            auth_flavors: vec![AUTH_UNIX],
        },
    }))
}

/// UMNT: forget a mount. Nothing is tracked per client, so this only
/// acknowledges.
fn umnt(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let mut dec = xdr::Decoder::new(args);
    let dirpath = dec
        .take_opaque_bounded(MNTPATHLEN)
        .map_err(HandlerError::Garbage)?;
    debug!(dirpath = %String::from_utf8_lossy(dirpath), "umnt");
    Ok(Box::new(()))
}

/// EXPORT: the export list, one entry, open to every group.
fn export(_args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    Ok(Box::new(ExportNode {
        value_follows: 1,
        directory: EXPORT_PATH.to_string(),
        groups: GroupNode {
            value_follows: 1,
            name: EXPORT_GROUP.to_string(),
            next: Some(Box::new(GroupNode::end())),
        },
        next: Some(Box::new(ExportNode::end())),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_xdr::{from_bytes, to_bytes};

    fn call(handler: fn(&[u8]) -> Result<Box<dyn Encode + Send>, HandlerError>, args: &[u8]) -> Vec<u8> {
        to_bytes(handler(args).unwrap().as_ref()).unwrap()
    }

    fn mnt_args(path: &str) -> Vec<u8> {
        to_bytes(path).unwrap()
    }

    #[test]
    fn mnt_returns_the_root_handle_and_auth_unix() {
        let reply = call(mnt, &mnt_args(EXPORT_PATH));
        assert_eq!(
            reply,
            [
                0x00, 0x00, 0x00, 0x00, // MNT3_OK
                0x00, 0x00, 0x00, 0x04, // handle length
                0x00, 0x00, 0x00, 0x2A, // the handle
                0x00, 0x00, 0x00, 0x01, // one auth flavor
                0x00, 0x00, 0x00, 0x01, // AUTH_UNIX
            ],
        );
    }

    #[test]
    fn mnt_accepts_any_dirpath() {
        let reply = call(mnt, &mnt_args("/somewhere/else"));
        let (decoded, _) = from_bytes::<MountRes>(&reply).unwrap();
        assert_eq!(decoded.status, MNT3_OK);
        assert_eq!(decoded.mount_info.file_handle, ROOT_FILE_HANDLE);
    }

    #[test]
    fn mnt_rejects_unparseable_arguments() {
        assert!(matches!(
            mnt(&[0x00, 0x00]),
            Err(HandlerError::Garbage(_)),
        ));
    }

    #[test]
    fn mnt_rejects_paths_over_the_rfc_limit() {
        let long = "x".repeat(MNTPATHLEN + 1);
        assert!(matches!(
            mnt(&mnt_args(&long)),
            Err(HandlerError::Garbage(_)),
        ));
    }

    #[test]
    fn export_lists_the_single_volume_for_every_group() {
        let reply = call(export, &[]);

        // value-follows 1, "/volume1/Public" (15 bytes + 1 pad),
        // group value-follows 1, "*" (1 byte + 3 pad),
        // group terminator, export terminator.
        assert_eq!(reply.len(), 44);

        let (decoded, consumed) = from_bytes::<ExportNode>(&reply).unwrap();
        assert_eq!(consumed, 44);
        assert_eq!(decoded.value_follows, 1);
        assert_eq!(decoded.directory, EXPORT_PATH);
        assert_eq!(decoded.groups.name, "*");
        assert_eq!(decoded.groups.next.as_deref(), Some(&GroupNode::end()));
        assert_eq!(decoded.next.as_deref(), Some(&ExportNode::end()));
    }

    #[test]
    fn null_and_umnt_reply_void() {
        assert!(call(null, &[]).is_empty());
        assert!(call(umnt, &mnt_args(EXPORT_PATH)).is_empty());
    }

    #[test]
    fn service_registers_the_four_procedures() {
        let svc = service();
        assert_eq!(svc.program(), PROGRAM);
        assert_eq!(svc.version(), VERSION);
    }
}
