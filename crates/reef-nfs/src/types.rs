//! Shared NFSv3 wire structures (RFC 1813 basic data types).

use reef_xdr::xdr_struct;

/// File type values (RFC 1813 `enum ftype3`).
pub const NF3REG: u32 = 1;
pub const NF3DIR: u32 = 2;

xdr_struct! {
    /// Seconds/nanoseconds pair (RFC 1813 `struct nfstime3`).
    pub struct NfsTime {
        seconds: u32,
        nanoseconds: u32,
    }
}

xdr_struct! {
    /// Device numbers for special files (RFC 1813 `struct specdata3`).
    pub struct SpecData {
        specdata1: u32,
        specdata2: u32,
    }
}

xdr_struct! {
    /// File attributes (RFC 1813 `struct fattr3`).
    pub struct FileAttr {
        file_type: u32,
        mode: u32,
        nlink: u32,
        uid: u32,
        gid: u32,
        size: u64,
        used: u64,
        rdev: SpecData,
        fsid: u64,
        fileid: u64,
        atime: NfsTime,
        mtime: NfsTime,
        ctime: NfsTime,
    }
}

xdr_struct! {
    /// Attributes that may follow a result (RFC 1813 `union post_op_attr`).
    pub struct PostOpAttr {
        switch attributes_follow: u32,
        case(1) attributes: FileAttr,
    }
}

xdr_struct! {
    /// A file handle that may follow a result (RFC 1813 `union post_op_fh3`).
    pub struct PostOpFileHandle {
        switch handle_follows: u32,
        case(1) handle: Vec<u8>,
    }
}

impl PostOpAttr {
    pub fn some(attributes: FileAttr) -> Self {
        Self {
            attributes_follow: 1,
            attributes,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl PostOpFileHandle {
    pub fn some(handle: Vec<u8>) -> Self {
        Self {
            handle_follows: 1,
            handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_xdr::{from_bytes, to_bytes};

    #[test]
    fn fattr3_is_21_words_on_the_wire() {
        let bytes = to_bytes(&FileAttr::default()).unwrap();
        assert_eq!(bytes.len(), 84);
    }

    #[test]
    fn absent_post_op_attr_is_a_single_word() {
        assert_eq!(to_bytes(&PostOpAttr::none()).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn present_post_op_attr_roundtrips() {
        let attr = PostOpAttr::some(FileAttr {
            file_type: NF3DIR,
            mode: 0o40777,
            nlink: 4,
            size: 4096,
            used: 8192,
            fsid: 0x388e4346cfc706a8,
            fileid: 16,
            ..FileAttr::default()
        });
        let bytes = to_bytes(&attr).unwrap();
        assert_eq!(bytes.len(), 4 + 84);

        let (decoded, _) = from_bytes::<PostOpAttr>(&bytes).unwrap();
        assert_eq!(decoded, attr);
    }

    #[test]
    fn post_op_handle_carries_the_opaque_handle() {
        let handle = PostOpFileHandle::some(vec![1, 2, 3]);
        let bytes = to_bytes(&handle).unwrap();
        // follows, length, 3 bytes + 1 pad
        assert_eq!(bytes, [0, 0, 0, 1, 0, 0, 0, 3, 1, 2, 3, 0]);
    }
}
