use std::io::Cursor;

use fablespeak::AudioError;
use fablespeak::audio::{
    DEFAULT_SAMPLE_RATE, base64_codec, decode_for_playback, encode_as_wav, wav_file_name,
};

/// Deterministic byte soup, enough variety to cover every base64 padding case.
fn sample_bytes(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

#[test]
fn base64_round_trips_bytes() {
    for len in 0..64 {
        let bytes = sample_bytes(len, len as u32);
        let text = base64_codec::encode(&bytes);
        assert_eq!(text.len() % 4, 0);
        assert_eq!(base64_codec::decode(&text).unwrap(), bytes);
        assert_eq!(base64_codec::encode(&base64_codec::decode(&text).unwrap()), text);
    }
}

#[test]
fn invalid_base64_is_malformed_payload() {
    for bad in ["!!!!", "AAA", "A===", "AA=A", "QUJD\n"] {
        assert!(
            matches!(base64_codec::decode(bad), Err(AudioError::MalformedPayload(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn wav_length_and_magic_for_any_body() {
    for len in [0usize, 1, 2, 3, 480, 4801] {
        let pcm = sample_bytes(len, 7);
        let wav = encode_as_wav(&pcm, DEFAULT_SAMPLE_RATE);
        assert_eq!(wav.len(), 44 + len);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 48000);
        assert_eq!(&wav[44..], pcm.as_slice());
    }
}

#[test]
fn exported_wav_is_readable_by_hound() {
    let samples: Vec<i16> = (0..2400).map(|i| ((i * 37) % 65536 - 32768) as i16).collect();
    let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    let payload = base64_codec::encode(&pcm);

    let wav = encode_as_wav(&base64_codec::decode(&payload).unwrap(), DEFAULT_SAMPLE_RATE);
    let mut reader = hound::WavReader::new(Cursor::new(wav.to_vec())).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 24000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let read: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(read, samples);
}

#[test]
fn playback_decode_matches_wav_body() {
    let pcm = [0x00, 0x00, 0x00, 0x80];
    let frames = decode_for_playback(&pcm, DEFAULT_SAMPLE_RATE, 1).unwrap();
    assert_eq!(frames.channels, vec![vec![0.0, -1.0]]);

    let odd = decode_for_playback(&[0, 0, 0, 0, 0x7f], DEFAULT_SAMPLE_RATE, 1).unwrap();
    assert_eq!(odd.frame_count(), 2);
}

#[test]
fn export_name_for_story_title() {
    assert_eq!(
        wav_file_name("The time-traveling compass"),
        "The_time-traveling_compass_fablespeak.wav"
    );
}
