//! Flow match fields: a normalized, typed match structure used throughout the flow-mod engine
//! and flow table, independent of any one wire encoding.
//!
//! Adapted from `little-dude-ofpkt`'s `oxm::fields` module: there, each match field is its own
//! struct implementing a `FlowMatchFieldRepr` trait whose job is to parse/emit an OXM TLV. Wire
//! encode/decode of OXM TLVs is an explicit external collaborator here (the wire codec sits
//! outside this core) — so this module keeps the "one type per field, with an optional mask"
//! shape but replaces the byte-level `parse`/`emit` methods with the match algebra the flow-mod
//! engine and flow table actually need: subset-of (non-strict match), equality (strict match),
//! and bitspace intersection (overlap detection).

use smoltcp::wire::{EthernetAddress, Ipv4Address};

/// A field value's bits, widened to `u128` so every match field can share one masking
/// implementation regardless of its native width.
pub trait FieldBits: Copy + PartialEq {
    fn to_bits(self) -> u128;
}

macro_rules! impl_field_bits_int {
    ($($ty:ty),+) => {
        $(impl FieldBits for $ty {
            fn to_bits(self) -> u128 {
                self as u128
            }
        })+
    };
}
impl_field_bits_int!(u8, u16, u32, u64);

impl FieldBits for EthernetAddress {
    fn to_bits(self) -> u128 {
        let bytes = self.0;
        let mut acc: u128 = 0;
        for b in bytes.iter() {
            acc = (acc << 8) | (*b as u128);
        }
        acc
    }
}

impl FieldBits for Ipv4Address {
    fn to_bits(self) -> u128 {
        let bytes = self.0;
        u32::from_be_bytes(bytes) as u128
    }
}

/// A field value with an optional mask. `mask = None` means "fully specified, no wildcard bits".
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Masked<T> {
    value: T,
    mask: Option<T>,
}

impl<T: FieldBits> Masked<T> {
    pub fn exact(value: T) -> Self {
        Masked { value, mask: None }
    }

    pub fn masked(value: T, mask: T) -> Self {
        Masked {
            value,
            mask: Some(mask),
        }
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn mask_bits(&self) -> u128 {
        match self.mask {
            Some(mask) => mask.to_bits(),
            None => u128::MAX,
        }
    }

    /// `self` (the query field) is a subset of `other` (the entry field): every bit `other`
    /// cares about, `self` also cares about and agrees on. This is the non-strict match rule:
    /// the query's unmasked bits must be a subset of the entry's match.
    pub fn is_subset_of(&self, other: &Masked<T>) -> bool {
        let other_mask = other.mask_bits();
        // self must not wildcard any bit other pins down.
        if self.mask_bits() & other_mask != other_mask {
            return false;
        }
        (self.value.to_bits() & other_mask) == (other.value.to_bits() & other_mask)
    }

    /// Exact equality of value and mask — the strict match rule.
    pub fn equals(&self, other: &Masked<T>) -> bool {
        self.mask_bits() == other.mask_bits()
            && (self.value.to_bits() & self.mask_bits()) == (other.value.to_bits() & self.mask_bits())
    }

    /// `true` if the two field's bitspaces share at least one concrete value — the overlap rule.
    pub fn overlaps(&self, other: &Masked<T>) -> bool {
        let common_mask = self.mask_bits() & other.mask_bits();
        (self.value.to_bits() & common_mask) == (other.value.to_bits() & common_mask)
    }
}

/// A single flow match field. Deliberately a small subset of the full OXM vocabulary
/// (`little-dude-ofpkt`'s `oxm::FlowMatchField` lists over 40 variants driven by wire codes this
/// core never reads off the wire) — enough to express the scenarios the flow-mod engine and the
/// FWD/PORT collaborators need: input port, the Ethernet/IPv4/transport 5-tuple, and VLAN id.
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum FlowMatchField {
    InPort(Masked<u32>),
    EthernetSource(Masked<EthernetAddress>),
    EthernetDestination(Masked<EthernetAddress>),
    EthernetType(Masked<u16>),
    VlanId(Masked<u16>),
    IpProtocol(Masked<u8>),
    Ipv4Source(Masked<Ipv4Address>),
    Ipv4Destination(Masked<Ipv4Address>),
    TcpSource(Masked<u16>),
    TcpDestination(Masked<u16>),
    UdpSource(Masked<u16>),
    UdpDestination(Masked<u16>),
    Metadata(Masked<u64>),
}

impl FlowMatchField {
    /// The OXM field id this variant corresponds to (`little-dude-ofpkt`'s
    /// `oxm::fields::consts`), used only to identify "the same field" across two match sets
    /// without a byte-level discriminant.
    fn discriminant(&self) -> u8 {
        match self {
            FlowMatchField::InPort(_) => 0,
            FlowMatchField::EthernetDestination(_) => 3,
            FlowMatchField::EthernetSource(_) => 4,
            FlowMatchField::EthernetType(_) => 5,
            FlowMatchField::VlanId(_) => 6,
            FlowMatchField::IpProtocol(_) => 10,
            FlowMatchField::Ipv4Source(_) => 11,
            FlowMatchField::Ipv4Destination(_) => 12,
            FlowMatchField::TcpSource(_) => 13,
            FlowMatchField::TcpDestination(_) => 14,
            FlowMatchField::UdpSource(_) => 15,
            FlowMatchField::UdpDestination(_) => 16,
            FlowMatchField::Metadata(_) => 2,
        }
    }

    fn is_subset_of(&self, other: &FlowMatchField) -> bool {
        use FlowMatchField::*;
        match (self, other) {
            (InPort(a), InPort(b)) => a.is_subset_of(b),
            (EthernetSource(a), EthernetSource(b)) => a.is_subset_of(b),
            (EthernetDestination(a), EthernetDestination(b)) => a.is_subset_of(b),
            (EthernetType(a), EthernetType(b)) => a.is_subset_of(b),
            (VlanId(a), VlanId(b)) => a.is_subset_of(b),
            (IpProtocol(a), IpProtocol(b)) => a.is_subset_of(b),
            (Ipv4Source(a), Ipv4Source(b)) => a.is_subset_of(b),
            (Ipv4Destination(a), Ipv4Destination(b)) => a.is_subset_of(b),
            (TcpSource(a), TcpSource(b)) => a.is_subset_of(b),
            (TcpDestination(a), TcpDestination(b)) => a.is_subset_of(b),
            (UdpSource(a), UdpSource(b)) => a.is_subset_of(b),
            (UdpDestination(a), UdpDestination(b)) => a.is_subset_of(b),
            (Metadata(a), Metadata(b)) => a.is_subset_of(b),
            _ => false,
        }
    }

    fn equals(&self, other: &FlowMatchField) -> bool {
        use FlowMatchField::*;
        match (self, other) {
            (InPort(a), InPort(b)) => a.equals(b),
            (EthernetSource(a), EthernetSource(b)) => a.equals(b),
            (EthernetDestination(a), EthernetDestination(b)) => a.equals(b),
            (EthernetType(a), EthernetType(b)) => a.equals(b),
            (VlanId(a), VlanId(b)) => a.equals(b),
            (IpProtocol(a), IpProtocol(b)) => a.equals(b),
            (Ipv4Source(a), Ipv4Source(b)) => a.equals(b),
            (Ipv4Destination(a), Ipv4Destination(b)) => a.equals(b),
            (TcpSource(a), TcpSource(b)) => a.equals(b),
            (TcpDestination(a), TcpDestination(b)) => a.equals(b),
            (UdpSource(a), UdpSource(b)) => a.equals(b),
            (UdpDestination(a), UdpDestination(b)) => a.equals(b),
            (Metadata(a), Metadata(b)) => a.equals(b),
            _ => false,
        }
    }

    fn overlaps(&self, other: &FlowMatchField) -> bool {
        use FlowMatchField::*;
        match (self, other) {
            (InPort(a), InPort(b)) => a.overlaps(b),
            (EthernetSource(a), EthernetSource(b)) => a.overlaps(b),
            (EthernetDestination(a), EthernetDestination(b)) => a.overlaps(b),
            (EthernetType(a), EthernetType(b)) => a.overlaps(b),
            (VlanId(a), VlanId(b)) => a.overlaps(b),
            (IpProtocol(a), IpProtocol(b)) => a.overlaps(b),
            (Ipv4Source(a), Ipv4Source(b)) => a.overlaps(b),
            (Ipv4Destination(a), Ipv4Destination(b)) => a.overlaps(b),
            (TcpSource(a), TcpSource(b)) => a.overlaps(b),
            (TcpDestination(a), TcpDestination(b)) => a.overlaps(b),
            (UdpSource(a), UdpSource(b)) => a.overlaps(b),
            (UdpDestination(a), UdpDestination(b)) => a.overlaps(b),
            (Metadata(a), Metadata(b)) => a.overlaps(b),
            _ => false,
        }
    }
}

/// A normalized match: a set of fields, at most one per field kind, exactly like
/// `little-dude-ofpkt`'s `oxm::FlowMatch` (`PacketRepr<Vec<Oxm<E>>>`) modeled a parsed OXM TLV
/// list. This crate's `Match` is the same "collection of typed fields" shape with the wire
/// parsing stripped out.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Match(Vec<FlowMatchField>);

impl Match {
    pub fn new() -> Self {
        Match(Vec::new())
    }

    pub fn with_field(mut self, field: FlowMatchField) -> Self {
        self.set(field);
        self
    }

    /// Insert or replace the field with the same discriminant.
    pub fn set(&mut self, field: FlowMatchField) {
        if let Some(slot) = self
            .0
            .iter_mut()
            .find(|f| f.discriminant() == field.discriminant())
        {
            *slot = field;
        } else {
            self.0.push(field);
        }
    }

    pub fn fields(&self) -> &[FlowMatchField] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `self` is a subset of `entry`: every field in `self` names a field present in `entry`
    /// and is itself a subset of it. A wildcarded-away field in `entry` that `self` does not
    /// name is fine (non-strict match ignores it).
    pub fn is_subset_of(&self, entry: &Match) -> bool {
        self.0.iter().all(|field| {
            entry
                .0
                .iter()
                .find(|e| e.discriminant() == field.discriminant())
                .map(|e| field.is_subset_of(e))
                .unwrap_or(false)
        })
    }

    /// Strict equality: same fields, same values, same masks.
    pub fn equals(&self, other: &Match) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().all(|field| {
                other
                    .0
                    .iter()
                    .find(|o| o.discriminant() == field.discriminant())
                    .map(|o| field.equals(o))
                    .unwrap_or(false)
            })
    }

    /// Two matches overlap if, for every field either names, the named fields' bitspaces
    /// intersect (a field one side wildcards entirely does not block the overlap).
    pub fn overlaps(&self, other: &Match) -> bool {
        for field in &self.0 {
            if let Some(o) = other
                .0
                .iter()
                .find(|o| o.discriminant() == field.discriminant())
            {
                if !field.overlaps(o) {
                    return false;
                }
            }
        }
        true
    }
}
