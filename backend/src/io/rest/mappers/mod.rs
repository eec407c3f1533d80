//! DTO <-> domain conversions for the REST handlers.

pub mod allotment_mapper;
pub mod chit_mapper;
pub mod member_mapper;
pub mod payment_mapper;

pub use allotment_mapper::AllotmentMapper;
pub use chit_mapper::ChitMapper;
pub use member_mapper::MemberMapper;
pub use payment_mapper::PaymentMapper;
