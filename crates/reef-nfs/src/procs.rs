//! Per-procedure argument parsing, result structures, and handlers.

use reef_stream::HandlerError;
use reef_xdr::{xdr_struct, Decoder, Encode, Error as XdrError};
use tracing::debug;

use crate::types::{FileAttr, NfsTime, PostOpAttr, PostOpFileHandle};
use crate::volume;
use crate::{NFS3_COOKIEVERFSIZE, NFS3_FHSIZE, NFS3_OK};

/// Bits granted by ACCESS: read, lookup, modify, extend, delete.
const ACCESS_ALL: u32 = 0x1f;

xdr_struct! {
    /// GETATTR result (RFC 1813 `union GETATTR3res`); the failure arm is
    /// void.
    pub struct GetAttrRes {
        switch status: u32,
        case(0) attributes: FileAttr,
    }
}

xdr_struct! {
    /// Successful LOOKUP payload (RFC 1813 `struct LOOKUP3resok`).
    pub struct LookupResOk {
        object: Vec<u8>,
        obj_attributes: PostOpAttr,
        dir_attributes: PostOpAttr,
    }
}

xdr_struct! {
    /// Failed LOOKUP payload (RFC 1813 `struct LOOKUP3resfail`).
    pub struct LookupResFail {
        dir_attributes: PostOpAttr,
    }
}

xdr_struct! {
    /// LOOKUP result union (RFC 1813 `union LOOKUP3res`).
    pub struct LookupRes {
        switch status: u32,
        case(0) ok: LookupResOk,
        default fail: LookupResFail,
    }
}

xdr_struct! {
    /// Successful ACCESS payload (RFC 1813 `struct ACCESS3resok`).
    pub struct AccessResOk {
        obj_attributes: PostOpAttr,
        access: u32,
    }
}

xdr_struct! {
    /// ACCESS result union (RFC 1813 `union ACCESS3res`).
    pub struct AccessRes {
        switch status: u32,
        case(0) ok: AccessResOk,
    }
}

xdr_struct! {
    /// Successful FSINFO payload (RFC 1813 `struct FSINFO3resok`).
    pub struct FsInfoResOk {
        obj_attributes: PostOpAttr,
        rtmax: u32,
        rtpref: u32,
        rtmult: u32,
        wtmax: u32,
        wtpref: u32,
        wtmult: u32,
        dtpref: u32,
        maxfilesize: u64,
        time_delta: NfsTime,
        properties: u32,
    }
}

xdr_struct! {
    /// FSINFO result union (RFC 1813 `union FSINFO3res`).
    pub struct FsInfoRes {
        switch status: u32,
        case(0) ok: FsInfoResOk,
    }
}

xdr_struct! {
    /// Successful PATHCONF payload (RFC 1813 `struct PATHCONF3resok`).
    pub struct PathConfResOk {
        obj_attributes: PostOpAttr,
        linkmax: u32,
        name_max: u32,
        no_trunc: bool,
        chown_restricted: bool,
        case_insensitive: bool,
        case_preserving: bool,
    }
}

xdr_struct! {
    /// PATHCONF result union (RFC 1813 `union PATHCONF3res`).
    pub struct PathConfRes {
        switch status: u32,
        case(0) ok: PathConfResOk,
    }
}

xdr_struct! {
    /// One READDIRPLUS entry, chained value-follows style (RFC 1813
    /// `struct entryplus3`).
    pub struct DirEntryPlus {
        switch value_follows: u32,
        case(1) fileid: u64,
        name: String,
        cookie: u64,
        name_attributes: PostOpAttr,
        name_handle: PostOpFileHandle,
        next: Option<Box<DirEntryPlus>>,
    }
}

xdr_struct! {
    /// The entry chain plus the EOF marker (RFC 1813 `struct dirlistplus3`).
    pub struct DirListPlus {
        entries: Option<Box<DirEntryPlus>>,
        eof: bool,
    }
}

xdr_struct! {
    /// Successful READDIRPLUS payload (RFC 1813 `struct READDIRPLUS3resok`).
    pub struct ReadDirPlusResOk {
        dir_attributes: PostOpAttr,
        cookie_verifier: [u8; 8],
        reply: DirListPlus,
    }
}

xdr_struct! {
    /// READDIRPLUS result union (RFC 1813 `union READDIRPLUS3res`).
    pub struct ReadDirPlusRes {
        switch status: u32,
        case(0) ok: ReadDirPlusResOk,
    }
}

impl DirEntryPlus {
    pub fn end() -> Self {
        Self::default()
    }
}

fn take_file_handle<'a>(dec: &mut Decoder<'a>) -> Result<&'a [u8], XdrError> {
    dec.take_opaque_bounded(NFS3_FHSIZE)
}

pub fn null(_args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    Ok(Box::new(()))
}

/// GETATTR: attributes of whatever handle the client presents; this
/// volume answers with the root directory.
pub fn getattr(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let mut dec = Decoder::new(args);
    take_file_handle(&mut dec)?;

    Ok(Box::new(GetAttrRes {
        status: NFS3_OK,
        attributes: volume::root_dir_attrs(),
    }))
}

/// LOOKUP: resolve a name inside a directory (RFC 1813 `diropargs3`).
/// Every name resolves to the demo directory object.
pub fn lookup(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let mut dec = Decoder::new(args);
    take_file_handle(&mut dec)?;
    let name = dec.take_opaque()?;
    debug!(name = %String::from_utf8_lossy(name), "lookup");

    Ok(Box::new(LookupRes {
        status: NFS3_OK,
        ok: LookupResOk {
            object: volume::DIR_HANDLE.to_vec(),
            obj_attributes: PostOpAttr::some(volume::root_dir_attrs()),
            dir_attributes: PostOpAttr::some(volume::root_dir_attrs()),
        },
        fail: LookupResFail::default(),
    }))
}

/// ACCESS: grant everything the client asked for, capped at the bits a
/// read-write volume supports.
pub fn access(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let mut dec = Decoder::new(args);
    take_file_handle(&mut dec)?;
    let requested = dec.take_u32()?;

    Ok(Box::new(AccessRes {
        status: NFS3_OK,
        ok: AccessResOk {
            obj_attributes: PostOpAttr::some(volume::root_dir_attrs()),
            access: requested & ACCESS_ALL,
        },
    }))
}

/// FSINFO: static capabilities of this server.
pub fn fsinfo(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let mut dec = Decoder::new(args);
    take_file_handle(&mut dec)?;

    Ok(Box::new(FsInfoRes {
        status: NFS3_OK,
        ok: FsInfoResOk {
            obj_attributes: PostOpAttr::none(),
            rtmax: 131072,
            rtpref: 131072,
            rtmult: 4096,
            wtmax: 131072,
            wtpref: 131072,
            wtmult: 4096,
            dtpref: 4096,
            maxfilesize: 8796093022207,
            time_delta: NfsTime {
                seconds: 1,
                nanoseconds: 0,
            },
            // FSF3_LINK | FSF3_SYMLINK | FSF3_HOMOGENEOUS | FSF3_CANSETTIME
            properties: 0x1b,
        },
    }))
}

/// PATHCONF: POSIX pathname limits for the volume.
pub fn pathconf(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let mut dec = Decoder::new(args);
    take_file_handle(&mut dec)?;

    Ok(Box::new(PathConfRes {
        status: NFS3_OK,
        ok: PathConfResOk {
            obj_attributes: PostOpAttr::none(),
            linkmax: 32000,
            name_max: 255,
            no_trunc: false,
            chown_restricted: true,
            case_insensitive: false,
            case_preserving: true,
        },
    }))
}

/// READDIRPLUS: the fixed listing, delivered whole with EOF set; cookies
/// in the request are ignored because the listing fits in one reply.
pub fn readdirplus(args: &[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> {
    let mut dec = Decoder::new(args);
    take_file_handle(&mut dec)?;
    let cookie = dec.take_u64()?;
    dec.take_fixed_opaque(NFS3_COOKIEVERFSIZE)?;
    let _dircount = dec.take_u32()?;
    let _maxcount = dec.take_u32()?;
    debug!(cookie, "readdirplus");

    Ok(Box::new(ReadDirPlusRes {
        status: NFS3_OK,
        ok: ReadDirPlusResOk {
            dir_attributes: PostOpAttr::some(volume::root_dir_attrs()),
            cookie_verifier: [0u8; 8],
            reply: volume::directory_listing(),
        },
    }))
}
