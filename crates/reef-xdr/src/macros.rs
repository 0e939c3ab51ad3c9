//! The `xdr_struct!` macro: declares a struct and derives its
//! [`Encode`](crate::Encode)/[`Decode`](crate::Decode) impls from
//! per-field union tags.
//!
//! Field grammar (every field ends with a comma):
//!
//! ```text
//! name: Type,                    always on the wire
//! switch name: u32,              uint32 discriminator, opens a switch
//! case(N, ...) name: Type,       on the wire iff the discriminator matches
//! default name: Type,            on the wire iff no earlier case matched
//! skip name: Type,               never on the wire
//! ```
//!
//! Untagged fields that follow a `case` or `default` inside an open
//! switch belong to that arm. A second `switch` field resets the state;
//! switches do not nest. Fields skipped by the discriminator are left at
//! their `Default` value when decoding, so all field types must be
//! `Default`.

/// Declare an XDR-encoded struct. See the [module docs](self) for the
/// field grammar.
#[macro_export]
macro_rules! xdr_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($fields:tt)*
        }
    ) => {
        $crate::__xdr_norm! {
            done []
            decl [$(#[$meta])* $vis $name]
            rest [$($fields)*]
        }
    };
}

/// Normalizes one field at a time into `{ kind [cases] [metas] name [ty] }`
/// records, then hands the full list to `__xdr_emit`.
#[macro_export]
#[doc(hidden)]
macro_rules! __xdr_norm {
    (
        done [$($done:tt)*]
        decl $decl:tt
        rest []
    ) => {
        $crate::__xdr_emit! {
            done [$($done)*]
            decl $decl
        }
    };
    (
        done [$($done:tt)*]
        decl $decl:tt
        rest [$(#[$fm:meta])* switch $f:ident : $t:ty , $($rest:tt)*]
    ) => {
        $crate::__xdr_norm! {
            done [$($done)* { switch [] [$(#[$fm])*] $f [$t] }]
            decl $decl
            rest [$($rest)*]
        }
    };
    (
        done [$($done:tt)*]
        decl $decl:tt
        rest [$(#[$fm:meta])* case($($cv:literal),+) $f:ident : $t:ty , $($rest:tt)*]
    ) => {
        $crate::__xdr_norm! {
            done [$($done)* { case [$($cv)+] [$(#[$fm])*] $f [$t] }]
            decl $decl
            rest [$($rest)*]
        }
    };
    (
        done [$($done:tt)*]
        decl $decl:tt
        rest [$(#[$fm:meta])* default $f:ident : $t:ty , $($rest:tt)*]
    ) => {
        $crate::__xdr_norm! {
            done [$($done)* { default [] [$(#[$fm])*] $f [$t] }]
            decl $decl
            rest [$($rest)*]
        }
    };
    (
        done [$($done:tt)*]
        decl $decl:tt
        rest [$(#[$fm:meta])* skip $f:ident : $t:ty , $($rest:tt)*]
    ) => {
        $crate::__xdr_norm! {
            done [$($done)* { skip [] [$(#[$fm])*] $f [$t] }]
            decl $decl
            rest [$($rest)*]
        }
    };
    (
        done [$($done:tt)*]
        decl $decl:tt
        rest [$(#[$fm:meta])* $f:ident : $t:ty , $($rest:tt)*]
    ) => {
        $crate::__xdr_norm! {
            done [$($done)* { plain [] [$(#[$fm])*] $f [$t] }]
            decl $decl
            rest [$($rest)*]
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __xdr_emit {
    (
        done [$({ $kind:ident [$($cv:literal)*] [$(#[$fm:meta])*] $f:ident [$t:ty] })*]
        decl [$(#[$meta:meta])* $vis:vis $name:ident]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fm])* pub $f: $t, )*
        }

        impl $crate::Encode for $name {
            fn encode(&self, enc: &mut $crate::Encoder) -> $crate::Result<()> {
                #[allow(unused_mut, unused_variables)]
                let mut sw = $crate::SwitchState::new();
                $( $crate::__xdr_encode_field!(self, enc, sw, $kind [$($cv)*] $f); )*
                Ok(())
            }
        }

        impl $crate::Decode for $name {
            fn decode(dec: &mut $crate::Decoder<'_>) -> $crate::Result<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut sw = $crate::SwitchState::new();
                $( let $f: $t = $crate::__xdr_decode_field!(dec, sw, $kind [$($cv)*]); )*
                Ok(Self { $($f,)* })
            }
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __xdr_encode_field {
    ($self_:ident, $enc:ident, $sw:ident, plain [] $f:ident) => {
        if $sw.armed() {
            $crate::Encode::encode(&$self_.$f, $enc)?;
        }
    };
    ($self_:ident, $enc:ident, $sw:ident, switch [] $f:ident) => {
        $sw.switch($self_.$f);
        $crate::Encode::encode(&$self_.$f, $enc)?;
    };
    ($self_:ident, $enc:ident, $sw:ident, case [$($cv:literal)+] $f:ident) => {
        if $sw.case(&[$($cv),+])? {
            $crate::Encode::encode(&$self_.$f, $enc)?;
        }
    };
    ($self_:ident, $enc:ident, $sw:ident, default [] $f:ident) => {
        if $sw.default_arm()? {
            $crate::Encode::encode(&$self_.$f, $enc)?;
        }
    };
    ($self_:ident, $enc:ident, $sw:ident, skip [] $f:ident) => {
        let _ = &$self_.$f;
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __xdr_decode_field {
    ($dec:ident, $sw:ident, plain []) => {
        if $sw.armed() {
            $crate::Decode::decode($dec)?
        } else {
            ::core::default::Default::default()
        }
    };
    ($dec:ident, $sw:ident, switch []) => {{
        let value: u32 = $crate::Decode::decode($dec)?;
        $sw.switch(value);
        value
    }};
    ($dec:ident, $sw:ident, case [$($cv:literal)+]) => {
        if $sw.case(&[$($cv),+])? {
            $crate::Decode::decode($dec)?
        } else {
            ::core::default::Default::default()
        }
    };
    ($dec:ident, $sw:ident, default []) => {
        if $sw.default_arm()? {
            $crate::Decode::decode($dec)?
        } else {
            ::core::default::Default::default()
        }
    };
    ($dec:ident, $sw:ident, skip []) => {
        ::core::default::Default::default()
    };
}

#[cfg(test)]
mod tests {
    use crate::{from_bytes, to_bytes};

    xdr_struct! {
        struct Pair {
            first: u32,
            second: u32,
        }
    }

    xdr_struct! {
        struct Failure {
            error: u32,
        }
    }

    xdr_struct! {
        struct Outcome {
            switch status: u32,
            case(0) success: Pair,
            default failure: Failure,
        }
    }

    #[test]
    fn union_selects_the_success_arm() {
        let ok = Outcome {
            status: 0,
            success: Pair {
                first: 44,
                second: 36,
            },
            failure: Failure::default(),
        };
        let bytes = to_bytes(&ok).unwrap();
        assert_eq!(
            bytes,
            [
                0x00, 0x00, 0x00, 0x00, // status
                0x00, 0x00, 0x00, 0x2C, // first
                0x00, 0x00, 0x00, 0x24, // second
            ],
        );

        let (decoded, consumed) = from_bytes::<Outcome>(&bytes).unwrap();
        assert_eq!(decoded, ok);
        assert_eq!(consumed, 12);
    }

    #[test]
    fn union_falls_through_to_the_default_arm() {
        let failed = Outcome {
            status: 1,
            success: Pair::default(),
            failure: Failure { error: 99 },
        };
        let bytes = to_bytes(&failed).unwrap();
        assert_eq!(bytes, [0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x63]);

        let (decoded, _) = from_bytes::<Outcome>(&bytes).unwrap();
        assert_eq!(decoded, failed);
        // The unselected arm stays at its zero value.
        assert_eq!(decoded.success, Pair::default());
    }

    xdr_struct! {
        struct GroupNode {
            switch value_follows: u32,
            case(1) gid: u32,
            next: Option<Box<GroupNode>>,
        }
    }

    xdr_struct! {
        struct UserNode {
            switch value_follows: u32,
            case(1) groups: GroupNode,
            next: Option<Box<UserNode>>,
        }
    }

    impl GroupNode {
        fn end() -> Self {
            Self::default()
        }
    }

    #[test]
    fn value_follows_chain_encodes_to_the_20_byte_form() {
        let user = UserNode {
            value_follows: 1,
            groups: GroupNode {
                value_follows: 1,
                gid: 12,
                next: Some(Box::new(GroupNode::end())),
            },
            next: Some(Box::new(UserNode {
                value_follows: 0,
                groups: GroupNode::default(),
                next: None,
            })),
        };

        let bytes = to_bytes(&user).unwrap();
        assert_eq!(
            bytes,
            [
                0x00, 0x00, 0x00, 0x01, // user: value follows
                0x00, 0x00, 0x00, 0x01, // group: value follows
                0x00, 0x00, 0x00, 0x0C, // gid 12
                0x00, 0x00, 0x00, 0x00, // group terminator
                0x00, 0x00, 0x00, 0x00, // user terminator
            ],
        );

        let (decoded, consumed) = from_bytes::<UserNode>(&bytes).unwrap();
        assert_eq!(consumed, 20);
        assert_eq!(decoded, user);
    }

    #[test]
    fn terminator_node_encodes_as_a_single_word() {
        assert_eq!(to_bytes(&GroupNode::end()).unwrap(), [0, 0, 0, 0]);
    }

    xdr_struct! {
        struct WithInternal {
            before: u32,
            skip scratch: u32,
            after: u32,
        }
    }

    #[test]
    fn skipped_fields_stay_off_the_wire() {
        let value = WithInternal {
            before: 1,
            scratch: 7,
            after: 2,
        };
        let bytes = to_bytes(&value).unwrap();
        assert_eq!(bytes, [0, 0, 0, 1, 0, 0, 0, 2]);

        let (decoded, _) = from_bytes::<WithInternal>(&bytes).unwrap();
        assert_eq!(decoded.scratch, 0);
        assert_eq!(decoded.before, 1);
        assert_eq!(decoded.after, 2);
    }

    xdr_struct! {
        struct TwoUnions {
            switch first_status: u32,
            case(0) first_ok: u32,
            switch second_status: u32,
            case(0) second_ok: u32,
            default second_err: u32,
        }
    }

    #[test]
    fn a_second_switch_resets_the_arm_state() {
        let value = TwoUnions {
            first_status: 0,
            first_ok: 10,
            second_status: 3,
            second_ok: 0,
            second_err: 20,
        };
        let bytes = to_bytes(&value).unwrap();
        assert_eq!(
            bytes,
            [
                0, 0, 0, 0, // first status
                0, 0, 0, 10, // first ok
                0, 0, 0, 3, // second status
                0, 0, 0, 20, // second err
            ],
        );

        let (decoded, _) = from_bytes::<TwoUnions>(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    xdr_struct! {
        struct MultiCase {
            switch status: u32,
            case(2, 5) detail: u32,
        }
    }

    #[test]
    fn case_arms_accept_multiple_discriminator_values() {
        for status in [2u32, 5] {
            let value = MultiCase { status, detail: 77 };
            let bytes = to_bytes(&value).unwrap();
            assert_eq!(bytes.len(), 8);
            let (decoded, _) = from_bytes::<MultiCase>(&bytes).unwrap();
            assert_eq!(decoded, value);
        }

        let off = MultiCase {
            status: 3,
            detail: 77,
        };
        assert_eq!(to_bytes(&off).unwrap().len(), 4);
    }
}
