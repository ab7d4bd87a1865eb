//! EDNS0 client subnet (RFC 7871) stamping.

use hickory_proto::op::{Edns, Message};
use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsCode, EdnsOption};
use ipnetwork::IpNetwork;
use std::borrow::Cow;

/// Returns `message` carrying a client subnet option for `subnet`.
///
/// The caller's message is never modified. If it already has a subnet option
/// and `override_existing` is false it is handed back untouched, otherwise
/// exactly one copy is made and stamped.
pub fn set_client_subnet(
    message: &Message,
    subnet: IpNetwork,
    override_existing: bool,
) -> Cow<'_, Message> {
    if has_client_subnet(message) && !override_existing {
        return Cow::Borrowed(message);
    }
    let mut copy = message.clone();
    apply_client_subnet(&mut copy, subnet, override_existing);
    Cow::Owned(copy)
}

/// In-place variant of [`set_client_subnet`]. Returns whether the message changed.
pub fn apply_client_subnet(message: &mut Message, subnet: IpNetwork, override_existing: bool) -> bool {
    if has_client_subnet(message) && !override_existing {
        return false;
    }
    let edns = message.extensions_mut().get_or_insert_with(Edns::new);
    let options = edns.options_mut();
    options.remove(EdnsCode::Subnet);
    options.insert(EdnsOption::Subnet(ClientSubnet::new(
        subnet.network(),
        subnet.prefix(),
        0,
    )));
    true
}

pub fn has_client_subnet(message: &Message) -> bool {
    message
        .extensions()
        .as_ref()
        .is_some_and(|edns| edns.options().get(EdnsCode::Subnet).is_some())
}

pub fn client_subnet(message: &Message) -> Option<&ClientSubnet> {
    match message.extensions().as_ref()?.options().get(EdnsCode::Subnet)? {
        EdnsOption::Subnet(subnet) => Some(subnet),
        _ => None,
    }
}
