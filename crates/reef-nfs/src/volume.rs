//! The synthesized demo volume.
//!
//! No file system backs this server; every attribute, handle, and
//! directory entry below is fixed data shaped like a small export with a
//! root directory and one file.

use crate::types::{FileAttr, NfsTime, PostOpAttr, PostOpFileHandle, NF3DIR, NF3REG};
use crate::{DirEntryPlus, DirListPlus};

/// File system identifier reported in every attribute block.
pub const VOLUME_FSID: u64 = 0x388e4346cfc706a8;

/// fileid of the exported root directory.
pub const ROOT_FILEID: u64 = 16;

/// Wire handle for directories, as a kernel NFS server would mint it.
pub const DIR_HANDLE: [u8; 36] = [
    0x01, 0x00, 0x07, 0x01, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xa8, 0x06, 0xc7,
    0xcf, 0x46, 0x43, 0x8e, 0x38, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Wire handle for the one regular file on the volume.
pub const FILE_HANDLE: [u8; 44] = [
    0x01, 0x00, 0x07, 0x02, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xa8, 0x06, 0xc7,
    0xcf, 0x46, 0x43, 0x8e, 0x38, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x76, 0x12,
    0x66, 0x02, 0x6d, 0x85, 0xd2, 0x28, 0x10, 0x00, 0x00, 0x00, 0xd9, 0x3c, 0x6d, 0x78,
];

/// Attributes of the exported root directory.
pub fn root_dir_attrs() -> FileAttr {
    FileAttr {
        file_type: NF3DIR,
        mode: 0o40777,
        nlink: 4,
        uid: 0,
        gid: 0,
        size: 4096,
        used: 8192,
        fsid: VOLUME_FSID,
        fileid: ROOT_FILEID,
        atime: NfsTime {
            seconds: 1563137262,
            nanoseconds: 460002975,
        },
        mtime: NfsTime {
            seconds: 1537128120,
            nanoseconds: 839607220,
        },
        ctime: NfsTime {
            seconds: 1537128120,
            nanoseconds: 839607220,
        },
        ..FileAttr::default()
    }
}

/// Attributes reported for the ".." and "." directory entries.
fn listed_dir_attrs(mode: u32) -> FileAttr {
    FileAttr {
        file_type: NF3DIR,
        mode,
        nlink: 15,
        uid: 0,
        gid: 0,
        size: 4096,
        used: 4096,
        fsid: VOLUME_FSID,
        fileid: 2,
        atime: NfsTime {
            seconds: 1562969613,
            nanoseconds: 760001904,
        },
        mtime: NfsTime {
            seconds: 1562969597,
            nanoseconds: 560001387,
        },
        ctime: NfsTime {
            seconds: 1562969597,
            nanoseconds: 560001387,
        },
        ..FileAttr::default()
    }
}

/// Attributes of the one regular file on the volume.
pub fn file_attrs() -> FileAttr {
    FileAttr {
        file_type: NF3REG,
        mode: 0o100666,
        nlink: 1,
        uid: 1027,
        gid: 100,
        size: 292,
        used: 8192,
        fsid: VOLUME_FSID,
        fileid: 40243830,
        atime: NfsTime {
            seconds: 1456162928,
            nanoseconds: 85375909,
        },
        mtime: NfsTime {
            seconds: 1389825403,
            nanoseconds: 480233665,
        },
        ctime: NfsTime {
            seconds: 1419273932,
            nanoseconds: 807093921,
        },
        ..FileAttr::default()
    }
}

/// The READDIRPLUS listing: "..", ".", and the file, EOF after one pass.
pub fn directory_listing() -> DirListPlus {
    let file = DirEntryPlus {
        value_follows: 1,
        fileid: 40243830,
        name: "gopher.go".to_string(),
        cookie: 3621999153351014942,
        name_attributes: PostOpAttr::some(file_attrs()),
        name_handle: PostOpFileHandle::some(FILE_HANDLE.to_vec()),
        next: Some(Box::new(DirEntryPlus::end())),
    };
    let dot = DirEntryPlus {
        value_follows: 1,
        fileid: ROOT_FILEID,
        name: ".".to_string(),
        cookie: 6684891493313481230,
        name_attributes: PostOpAttr::some(listed_dir_attrs(0o40755)),
        name_handle: PostOpFileHandle::some(DIR_HANDLE.to_vec()),
        next: Some(Box::new(file)),
    };
    let parent = DirEntryPlus {
        value_follows: 1,
        fileid: 2,
        name: "..".to_string(),
        cookie: 6457138716124813847,
        name_attributes: PostOpAttr::some(listed_dir_attrs(0o40777)),
        name_handle: PostOpFileHandle::some(DIR_HANDLE.to_vec()),
        next: Some(Box::new(dot)),
    };

    DirListPlus {
        entries: Some(Box::new(parent)),
        eof: true,
    }
}
