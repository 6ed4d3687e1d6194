//! The `h1,h2,h3,h4,p1,p2` tuple used by PASV replies and PORT
//! requests.

use std::net::Ipv4Addr;

/// Formats the tuple for a 227 reply.
pub(crate) fn pasv_tuple(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!("{},{},{},{},{},{}", h1, h2, h3, h4, port >> 8, port & 0xff)
}

/// Parses a PORT argument back into the client address and data port.
pub(crate) fn parse_port_tuple(args: &str) -> Option<(Ipv4Addr, u16)> {
    let mut fields = [0u8; 6];
    let mut parts = args.split(',');
    for field in fields.iter_mut() {
        *field = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    let [h1, h2, h3, h4, p1, p2] = fields;
    Some((Ipv4Addr::new(h1, h2, h3, h4), u16::from(p1) << 8 | u16::from(p2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_ip_and_split_port() {
        assert_eq!(pasv_tuple(Ipv4Addr::new(192, 168, 0, 7), 55601), "192,168,0,7,217,49");
    }

    #[test]
    fn round_trips_any_port() {
        let ip = Ipv4Addr::new(10, 0, 0, 1);
        for port in [0u16, 1, 255, 256, 55600, u16::MAX] {
            assert_eq!(parse_port_tuple(&pasv_tuple(ip, port)), Some((ip, port)));
        }
    }

    #[test]
    fn tolerates_spaces_around_fields() {
        assert_eq!(
            parse_port_tuple("127, 0, 0, 1, 4, 210"),
            Some((Ipv4Addr::LOCALHOST, 4 * 256 + 210))
        );
    }

    #[test]
    fn rejects_malformed_tuples() {
        assert_eq!(parse_port_tuple(""), None);
        assert_eq!(parse_port_tuple("1,2,3,4,5"), None);
        assert_eq!(parse_port_tuple("1,2,3,4,5,6,7"), None);
        assert_eq!(parse_port_tuple("256,2,3,4,5,6"), None);
        assert_eq!(parse_port_tuple("a,b,c,d,e,f"), None);
    }
}
