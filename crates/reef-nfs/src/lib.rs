#![deny(unsafe_code)]

//! NFS version 3 (RFC 1813).
//!
//! Serves the probe procedures a stock kernel mounter issues after MNT:
//! attributes, lookup, access, fs limits, and a READDIRPLUS listing, all
//! answered from the synthesized [`volume`].

mod procs;
mod types;
pub mod volume;

pub use procs::{
    AccessRes, AccessResOk, DirEntryPlus, DirListPlus, FsInfoRes, FsInfoResOk, GetAttrRes,
    LookupRes, LookupResFail, LookupResOk, PathConfRes, PathConfResOk, ReadDirPlusRes,
    ReadDirPlusResOk,
};
pub use types::{FileAttr, NfsTime, PostOpAttr, PostOpFileHandle, SpecData, NF3DIR, NF3REG};

use reef_stream::RpcService;

pub const PROGRAM: u32 = 100003;
pub const VERSION: u32 = 3;

pub const PROC_NULL: u32 = 0;
pub const PROC_GETATTR: u32 = 1;
pub const PROC_SETATTR: u32 = 2;
pub const PROC_LOOKUP: u32 = 3;
pub const PROC_ACCESS: u32 = 4;
pub const PROC_READLINK: u32 = 5;
pub const PROC_READ: u32 = 6;
pub const PROC_WRITE: u32 = 7;
pub const PROC_CREATE: u32 = 8;
pub const PROC_MKDIR: u32 = 9;
pub const PROC_SYMLINK: u32 = 10;
pub const PROC_MKNOD: u32 = 11;
pub const PROC_REMOVE: u32 = 12;
pub const PROC_RMDIR: u32 = 13;
pub const PROC_RENAME: u32 = 14;
pub const PROC_LINK: u32 = 15;
pub const PROC_READDIR: u32 = 16;
pub const PROC_READDIRPLUS: u32 = 17;
pub const PROC_FSSTAT: u32 = 18;
pub const PROC_FSINFO: u32 = 19;
pub const PROC_PATHCONF: u32 = 20;
pub const PROC_COMMIT: u32 = 21;

/// Status codes this server actually emits (RFC 1813 `enum nfsstat3`).
pub const NFS3_OK: u32 = 0;
pub const NFS3ERR_SERVERFAULT: u32 = 10006;

/// Size limits (RFC 1813 §2.4).
pub const NFS3_FHSIZE: usize = 64;
pub const NFS3_COOKIEVERFSIZE: usize = 8;

/// The NFS service with its procedures registered; the caller adds
/// listeners and serves it.
pub fn service() -> RpcService {
    let mut svc = RpcService::new("nfsv3", PROGRAM, VERSION);
    svc.register_procedure(PROC_NULL, procs::null);
    svc.register_procedure(PROC_GETATTR, procs::getattr);
    svc.register_procedure(PROC_LOOKUP, procs::lookup);
    svc.register_procedure(PROC_ACCESS, procs::access);
    svc.register_procedure(PROC_READDIRPLUS, procs::readdirplus);
    svc.register_procedure(PROC_FSINFO, procs::fsinfo);
    svc.register_procedure(PROC_PATHCONF, procs::pathconf);
    svc
}
