//! Flat binary view of a work order for client display.
//!
//! Layout, all integers big-endian:
//!
//! | field       | encoding                                |
//! |-------------|-----------------------------------------|
//! | id          | i32                                     |
//! | priority    | i32                                     |
//! | claimedBy   | i32, 0 when unclaimed                   |
//! | typeOrdinal | i32                                     |
//! | value       | varint byte length (<= 2 bytes) + UTF-8 |
//!
//! Ids above `i32::MAX` have no encoding and are refused.

use colony_types::{CitizenId, WorkOrderId, WorkOrderType, WorkOrderView};
use tracing::error;

use crate::error::ViewError;
use crate::order::WorkOrder;

/// Longest string the 2-byte length prefix can describe.
pub const MAX_VIEW_STRING_LEN: usize = (1 << 14) - 1;

/// Bit offsets of the (at most two) 7-bit groups of the length prefix.
const VARINT_SHIFTS: [u32; 2] = [0, 7];

/// Encode `order`'s client view.
pub fn serialize_view_network_data(order: &dyn WorkOrder) -> Result<Vec<u8>, ViewError> {
    let mut buf = Vec::new();
    encode_view(&order.view(), &mut buf)?;
    Ok(buf)
}

/// Append the encoding of `view` to `buf`.
///
/// On error `buf` is left unchanged.
pub fn encode_view(view: &WorkOrderView, buf: &mut Vec<u8>) -> Result<(), ViewError> {
    let value = view.value.as_bytes();
    if value.len() > MAX_VIEW_STRING_LEN {
        return Err(ViewError::StringTooLong { len: value.len() });
    }

    let id = signed(view.id.get(), "id")?;
    let claimed_by = signed(CitizenId::raw_or_zero(view.claimed_by), "claimedBy")?;

    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&view.priority.to_be_bytes());
    buf.extend_from_slice(&claimed_by.to_be_bytes());
    buf.extend_from_slice(&view.order_type.ordinal().to_be_bytes());
    write_varint(buf, value.len());
    buf.extend_from_slice(value);
    Ok(())
}

/// Decode one view from the front of `bytes`, returning it with the number
/// of bytes consumed.
pub fn decode_view(bytes: &[u8]) -> Result<(WorkOrderView, usize), ViewError> {
    let mut reader = Reader { rest: bytes };

    let id = non_negative(reader.i32("id")?, "id")?;
    let priority = reader.i32("priority")?;
    let claimed_by = CitizenId::new(non_negative(reader.i32("claimedBy")?, "claimedBy")?);
    let ordinal = reader.i32("typeOrdinal")?;
    let order_type = u32::try_from(ordinal)
        .ok()
        .and_then(WorkOrderType::from_ordinal)
        .ok_or(ViewError::UnknownType { ordinal })?;

    let len = reader.varint()?;
    let value = std::str::from_utf8(reader.take(len, "value")?)
        .map_err(|_utf8| ViewError::InvalidUtf8)?
        .to_owned();

    let consumed = bytes.len().saturating_sub(reader.rest.len());
    Ok((
        WorkOrderView {
            id: WorkOrderId(id),
            priority,
            claimed_by,
            order_type,
            value,
        },
        consumed,
    ))
}

/// Decode a view, or `None` (with an error log) if the buffer is malformed.
pub fn create_work_order_view(bytes: &[u8]) -> Option<WorkOrderView> {
    match decode_view(bytes) {
        Ok((view, _)) => Some(view),
        Err(err) => {
            error!(error = %err, len = bytes.len(), "work order view could not be decoded");
            None
        }
    }
}

fn signed(value: u32, field: &'static str) -> Result<i32, ViewError> {
    i32::try_from(value).map_err(|_overflow| ViewError::IdOutOfRange { field, value })
}

fn non_negative(value: i32, field: &'static str) -> Result<u32, ViewError> {
    u32::try_from(value).map_err(|_negative| ViewError::NegativeId { field, value })
}

fn write_varint(buf: &mut Vec<u8>, mut value: usize) {
    loop {
        let low = u8::try_from(value & 0x7F).unwrap_or(0);
        value >>= 7;
        if value == 0 {
            buf.push(low);
            return;
        }
        buf.push(low | 0x80);
    }
}

struct Reader<'a> {
    rest: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], ViewError> {
        let (head, tail) = self
            .rest
            .split_at_checked(n)
            .ok_or(ViewError::Truncated { field })?;
        self.rest = tail;
        Ok(head)
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, ViewError> {
        let raw: [u8; 4] = self
            .take(4, field)?
            .try_into()
            .map_err(|_len| ViewError::Truncated { field })?;
        Ok(i32::from_be_bytes(raw))
    }

    fn varint(&mut self) -> Result<usize, ViewError> {
        let mut value = 0_usize;
        for shift in VARINT_SHIFTS {
            let [byte] = *self.take(1, "value length")? else {
                return Err(ViewError::Truncated {
                    field: "value length",
                });
            };
            value |= usize::from(byte & 0x7F).checked_shl(shift).unwrap_or(0);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ViewError::StringTooLong { len: value })
    }
}
