use std::io::Cursor;
use tawara_ebml::io::blocking::ReadFrom;
use tawara_ebml::prelude::*;

fn sample_block(track_number: u64, timecode: i16, data: &[u8]) -> SimpleBlock {
    let payload = BlockPayload {
        track_number,
        timecode,
        invisible: false,
        lacing: Lacing::None,
        extra_flags: 0x80,
        frames: vec![data.to_vec()],
    };
    let mut body = Vec::new();
    payload.encode(&mut body).unwrap();
    SimpleBlock(body)
}

fn sample_info() -> Info {
    Info {
        timestamp_scale: TimestampScale(1_000_000),
        muxing_app: MuxingApp::new("tawara-ebml".to_string()),
        writing_app: WritingApp::new("integration-test".to_string()),
        ..Default::default()
    }
}

fn sample_tracks() -> Tracks {
    Tracks {
        track_entry: vec![TrackEntry {
            track_number: TrackNumber(1),
            track_uid: TrackUid(42),
            track_type: TrackType(1),
            codec_id: CodecId::new("V_VP9".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[test]
fn file_cluster_write_then_open_round_trips_blocks() {
    let mut buf = Cursor::new(Vec::new());

    let mut cluster = FileCluster::new(1000);
    cluster.start_write(&mut buf).unwrap();
    cluster
        .push_back(&mut buf, sample_block(1, 0, &[1, 2, 3]))
        .unwrap();
    cluster
        .push_back(&mut buf, sample_block(1, 40, &[4, 5, 6, 7]))
        .unwrap();
    cluster.finish_write(&mut buf).unwrap();

    let bytes = buf.into_inner();
    let mut r = Cursor::new(&bytes[..]);
    let header = Header::read_from(&mut r).unwrap();
    assert_eq!(header.id, MemoryCluster::ID);
    let opened = FileCluster::open(&header, &mut r).unwrap();

    assert_eq!(opened.timestamp(), 1000);
    assert_eq!(opened.block_count(), 2);
    assert!(!opened.is_empty());

    let frames: Vec<_> = opened
        .blocks(&mut r)
        .collect::<tawara_ebml::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(frames.len(), 2);
    match &frames[0] {
        ClusterBlock::Simple(b) => {
            let payload = BlockPayload::decode(b).unwrap();
            assert_eq!(payload.frames, vec![vec![1, 2, 3]]);
        }
        ClusterBlock::Group(_) => panic!("expected a SimpleBlock"),
    }
}

#[test]
fn file_cluster_rejects_push_before_start() {
    let mut buf = Cursor::new(Vec::new());
    let mut cluster = FileCluster::new(0);
    let err = cluster
        .push_back(&mut buf, sample_block(1, 0, &[1]))
        .unwrap_err();
    assert!(matches!(err, tawara_ebml::Error::NotWriting));
}

#[test]
fn file_cluster_recover_discards_partial_tail() {
    let mut buf = Cursor::new(Vec::new());
    let mut cluster = FileCluster::new(0);
    cluster.start_write(&mut buf).unwrap();
    cluster
        .push_back(&mut buf, sample_block(1, 0, &[1, 2, 3]))
        .unwrap();
    let good_len = buf.position();

    // simulate a partially-written next block landing extra bytes on the wire
    use std::io::Write;
    buf.write_all(&[0xFF; 5]).unwrap();
    assert!(buf.position() > good_len);

    cluster.recover(&mut buf).unwrap();
    assert_eq!(buf.position(), good_len);
}

#[test]
fn segment_writer_round_trips_through_segment_read() {
    let info = sample_info();
    let tracks = sample_tracks();

    let mut buf = Cursor::new(Vec::new());
    let mut writer = SegmentWriter::start(&mut buf, info.clone(), &tracks, None, 128, 512).unwrap();

    {
        let mut cluster = writer.write_cluster(0).unwrap();
        cluster.push_back(sample_block(1, 0, &[9, 9, 9])).unwrap();
        cluster.finish().unwrap();
    }

    let mut final_info = info.clone();
    final_info.duration = Some(Duration(12345.0));
    writer.set_final_info(final_info.clone());
    writer.finish().unwrap();

    let bytes = buf.into_inner();
    let mut r = Cursor::new(&bytes[..]);
    let segment = Segment::read_from(&mut r).unwrap();

    assert_eq!(segment.tracks.track_entry.len(), 1);
    assert_eq!(segment.memory_cluster.len(), 1);
    assert_eq!(*segment.memory_cluster[0].timestamp, 0);
    assert_eq!(segment.info.duration, Some(Duration(12345.0)));

    assert_eq!(segment.seek_head.len(), 1);
    let seek_head = &segment.seek_head[0];
    assert!(seek_head.find(Info::ID).is_some());
    assert!(seek_head.find(Tracks::ID).is_some());
    assert!(seek_head.find(MemoryCluster::ID).is_some());
}

#[test]
fn segment_writer_fails_when_info_padding_too_small() {
    let info = sample_info();
    let tracks = sample_tracks();
    let mut buf = Cursor::new(Vec::new());
    // 1 byte can't even hold a minimal Void placeholder, let alone Info.
    let err = SegmentWriter::start(&mut buf, info, &tracks, None, 128, 1).unwrap_err();
    assert!(matches!(err, tawara_ebml::Error::BodySizeOverflow { .. }));
}

#[test]
fn segment_writer_drop_finalises_without_explicit_finish() {
    let info = sample_info();
    let tracks = sample_tracks();
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer =
            SegmentWriter::start(&mut buf, info.clone(), &tracks, None, 128, 512).unwrap();
        let mut cluster = writer.write_cluster(5).unwrap();
        cluster.push_back(sample_block(1, 0, &[1])).unwrap();
        cluster.finish().unwrap();
        // no explicit writer.finish(): Drop must back-patch the segment size.
    }

    let bytes = buf.into_inner();
    let mut r = Cursor::new(&bytes[..]);
    let segment = Segment::read_from(&mut r).unwrap();
    assert_eq!(segment.memory_cluster.len(), 1);
    assert_eq!(*segment.memory_cluster[0].timestamp, 5);
}
