//! End-to-end scenarios exercising the writer and reader together across a
//! file rollover, complementing the unit tests inside each module.

use eventstore::filename::{FileExtension, RawFileName, RawFileNameCallback};
use eventstore::header::RunParameters;
use eventstore::reader::{ReadStatus, StorageReader};
use eventstore::writer::{StorageWriter, WriterLimits, WriterMetadata};
use eventstore::LocalFileSource;

fn metadata() -> WriterMetadata {
    WriterMetadata {
        run_parameters: RunParameters {
            run_number: 42,
            max_events: 0,
            rec_enable: true,
            trigger_type: 1,
            detector_mask_lsb: 0,
            detector_mask_msb: 0,
            beam_type: 0,
            beam_energy: 0,
        },
        project: "data_test".to_string(),
        stream_type: "physics".to_string(),
        stream_name: "Main".to_string(),
        prod_step: "daq".to_string(),
        data_type: "RAW".to_string(),
        lumi_block: 1,
        app_name: "SFO-1".to_string(),
        free_metadata: Vec::new(),
    }
}

#[test]
fn rollover_then_sequence_read_returns_events_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let template = RawFileName::new("data_test", 42, "physics", "Main", "daq", "RAW", 1, "SFO-1");
    let callback = RawFileNameCallback::new(dir.path(), template);
    let limits = WriterLimits { max_file_mb: 10_000, max_file_events: 2 };
    let mut writer = StorageWriter::new(callback, metadata(), limits);

    let events: Vec<Vec<u8>> = (0u8..5).map(|i| vec![i; 16 + i as usize]).collect();
    for event in &events {
        writer.put_data(event).unwrap();
    }
    writer.finalize().unwrap();

    let first_name =
        RawFileName::new("data_test", 42, "physics", "Main", "daq", "RAW", 1, "SFO-1").with_extension(FileExtension::Data);
    let mut reader = StorageReader::<LocalFileSource>::open(dir.path().join(first_name.to_string())).unwrap();
    reader.enable_sequence_reading();

    let mut read_back = Vec::new();
    loop {
        let (status, data) = reader.get_data(None).unwrap();
        match status {
            ReadStatus::Ok => read_back.push(data.unwrap()),
            ReadStatus::NoSeq | ReadStatus::Woff => break,
            ReadStatus::Wait => panic!("closed files should never report Wait"),
        }
    }

    assert_eq!(read_back, events);
    assert!(reader.end_of_file_sequence());
}

#[test]
fn record_written_at_a_position_is_retrievable_from_that_position() {
    let dir = tempfile::tempdir().unwrap();
    let template = RawFileName::new("data_test", 7, "physics", "Main", "daq", "RAW", 0, "SFO-1");
    let callback = RawFileNameCallback::new(dir.path(), template);
    let mut writer = StorageWriter::new(callback, metadata(), WriterLimits::default());

    let first = vec![0xAAu8; 20];
    let second = vec![0xBBu8; 37];
    writer.put_data(&first).unwrap();
    writer.put_data(&second).unwrap();
    writer.finalize().unwrap();

    let name = RawFileName::new("data_test", 7, "physics", "Main", "daq", "RAW", 0, "SFO-1")
        .with_extension(FileExtension::Data);
    let mut reader = StorageReader::<LocalFileSource>::open(dir.path().join(name.to_string())).unwrap();

    let (status, data) = reader.get_data(None).unwrap();
    assert_eq!(status, ReadStatus::Ok);
    assert_eq!(data.unwrap(), first);
    let position_of_second = reader.get_position();

    let (status, data) = reader.get_data(None).unwrap();
    assert_eq!(status, ReadStatus::Ok);
    assert_eq!(data.unwrap(), second);

    let (status, data) = reader.get_data(Some(position_of_second)).unwrap();
    assert_eq!(status, ReadStatus::Ok);
    assert_eq!(data.unwrap(), second);
}

#[test]
fn dropping_an_unfinalized_writer_still_closes_the_file_to_dot_data() {
    let dir = tempfile::tempdir().unwrap();
    let template = RawFileName::new("data_test", 99, "physics", "Main", "daq", "RAW", 0, "SFO-1");
    let callback = RawFileNameCallback::new(dir.path(), template);
    let mut writer = StorageWriter::new(callback, metadata(), WriterLimits::default());
    writer.put_data(&[1, 2, 3]).unwrap();
    // No finalize()/close_file() call: exercises the best-effort Drop path.
    drop(writer);

    let writing_name = RawFileName::new("data_test", 99, "physics", "Main", "daq", "RAW", 0, "SFO-1").to_string();
    assert!(!dir.path().join(&writing_name).exists(), "Drop should have closed the file to .data");
    let closed_name = RawFileName::new("data_test", 99, "physics", "Main", "daq", "RAW", 0, "SFO-1")
        .with_extension(FileExtension::Data)
        .to_string();
    assert!(dir.path().join(&closed_name).exists());
}
