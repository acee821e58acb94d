use bytes::Bytes;
use ffmpeg_next::Rational;

/// What the session needs to know about an encoder output unit. The payload
/// itself is never inspected.
pub trait EncodedUnit {
    fn pts(&self) -> Option<i64>;
    fn size(&self) -> usize;
    fn is_key(&self) -> bool;
}

/// Encoder output packet together with the time base its timestamps are in.
#[derive(Clone)]
pub struct EncodedPacket {
    packet: ffmpeg_next::codec::packet::Packet,
    time_base: Rational,
}

impl EncodedPacket {
    pub fn dts(&self) -> Option<i64> {
        self.packet.dts()
    }

    pub fn data(&self) -> Bytes {
        self.packet
            .data()
            .map(Bytes::copy_from_slice)
            .unwrap_or_default()
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn get_mut(&mut self) -> &mut ffmpeg_next::codec::packet::Packet {
        &mut self.packet
    }
}

impl EncodedUnit for EncodedPacket {
    fn pts(&self) -> Option<i64> {
        self.packet.pts()
    }

    fn size(&self) -> usize {
        self.packet.size()
    }

    fn is_key(&self) -> bool {
        self.packet.is_key()
    }
}

impl From<(ffmpeg_next::codec::packet::Packet, Rational)> for EncodedPacket {
    fn from((packet, time_base): (ffmpeg_next::codec::packet::Packet, Rational)) -> Self {
        Self { packet, time_base }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_accessors() {
        let mut raw = ffmpeg_next::codec::packet::Packet::copy(&[0, 0, 0, 1, 0x65]);
        raw.set_pts(Some(4));
        raw.set_dts(Some(3));
        let packet = EncodedPacket::from((raw, Rational::new(1, 25)));
        assert_eq!(packet.pts(), Some(4));
        assert_eq!(packet.dts(), Some(3));
        assert_eq!(packet.size(), 5);
        assert_eq!(&packet.data()[..], &[0, 0, 0, 1, 0x65]);
        assert_eq!(packet.time_base(), Rational::new(1, 25));
    }
}
