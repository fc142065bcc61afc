//! End-to-end export through both ports: direct writes, piped input,
//! callback and pipeable output, headers and a full input queue.


use std::convert::Infallible;

use futures::{SinkExt, StreamExt};
use rowcast::{open, Ack, Output, Record, StreamError, WriteStatus};
use test_data_gen::{
    expected_cycle, repeated_records, sample_config, sample_records, EXPECTED_LINES, HEADER,
};

/// Feed `records` into an upstream channel, as a separate stage would.
async fn feed_upstream(
    mut tx: futures::channel::mpsc::Sender<Record>,
    records: Vec<Record>,
) -> usize {
    let mut sent = 0;
    for record in records {
        if tx.send(record).await.is_err() {
            break;
        }
        sent += 1;
    }
    sent
}

/// Drain a line channel the way a downstream writable would.
async fn collect_lines(mut rx: futures::channel::mpsc::Receiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(line) = rx.next().await {
        lines.push(line);
    }
    lines
}

#[tokio::test]
async fn test_records_to_lines_with_callback() {
    let (sink, source) = open(sample_config()).unwrap();

    for record in sample_records() {
        assert_eq!(sink.write(record).unwrap(), WriteStatus::Ready);
    }
    sink.close();

    let mut lines = Vec::new();
    let done = source
        .subscribe(|line, ack| {
            lines.push(line);
            ack.ack();
        })
        .await
        .expect("should finish without error");

    assert_eq!(done.records, 5);
    assert_eq!(done.lines, 5);
    assert_eq!(lines, EXPECTED_LINES);
}

#[tokio::test]
async fn test_input_is_pipeable() {
    let (sink, source) = open(sample_config()).unwrap();
    let (up_tx, up_rx) = futures::channel::mpsc::channel::<Record>(4);

    let mut lines = Vec::new();
    let (sent, piped, done) = tokio::join!(
        feed_upstream(up_tx, sample_records()),
        sink.pipe_from(up_rx.map(Ok::<_, Infallible>)),
        source.subscribe(|line, ack| {
            lines.push(line);
            ack.ack();
        }),
    );

    assert_eq!(sent, 5);
    assert_eq!(piped.unwrap(), 5);
    assert_eq!(done.unwrap().records, 5);
    assert_eq!(lines, EXPECTED_LINES);
}

#[tokio::test]
async fn test_output_is_pipeable() {
    let (sink, source) = open(sample_config()).unwrap();
    let (up_tx, up_rx) = futures::channel::mpsc::channel::<Record>(4);
    let (down_tx, down_rx) = futures::channel::mpsc::channel::<String>(1);

    let (_, piped, done, lines) = tokio::join!(
        feed_upstream(up_tx, sample_records()),
        sink.pipe_from(up_rx.map(Ok::<_, Infallible>)),
        source.pipe_to(down_tx),
        collect_lines(down_rx),
    );

    assert_eq!(piped.unwrap(), 5);
    assert_eq!(done.unwrap().lines, 5);
    assert_eq!(lines, EXPECTED_LINES);
}

#[tokio::test]
async fn test_headers_with_streams() {
    let (sink, source) = open(sample_config().with_headers(true)).unwrap();
    let (up_tx, up_rx) = futures::channel::mpsc::channel::<Record>(4);
    let (down_tx, down_rx) = futures::channel::mpsc::channel::<String>(1);

    let (_, _, done, lines) = tokio::join!(
        feed_upstream(up_tx, sample_records()),
        sink.pipe_from(up_rx.map(Ok::<_, Infallible>)),
        source.pipe_to(down_tx),
        collect_lines(down_rx),
    );

    let done = done.unwrap();
    assert_eq!(done.records, 5);
    assert_eq!(done.lines, 6);
    assert_eq!(lines[0], HEADER);
    assert_eq!(&lines[1..], EXPECTED_LINES);
}

#[tokio::test]
async fn test_headers_with_records_and_callback() {
    let (sink, source) = open(sample_config().with_headers(true)).unwrap();
    for record in sample_records() {
        sink.write(record).unwrap();
    }
    sink.close();

    let mut lines = Vec::new();
    source
        .subscribe(|line, ack| {
            lines.push(line);
            ack.ack();
        })
        .await
        .unwrap();

    assert_eq!(lines.iter().filter(|l| l.as_str() == HEADER).count(), 1);
    assert_eq!(lines[0], HEADER);
    assert_eq!(&lines[1..], EXPECTED_LINES);
}

#[tokio::test]
async fn test_streams_with_full_input_queue() {
    let (sink, source) = open(sample_config().with_high_water_mark(4)).unwrap();
    let (up_tx, up_rx) = futures::channel::mpsc::channel::<Record>(8);
    let (down_tx, down_rx) = futures::channel::mpsc::channel::<String>(2);

    let (sent, piped, done, lines) = tokio::join!(
        feed_upstream(up_tx, repeated_records(40)),
        sink.pipe_from(up_rx.map(Ok::<_, Infallible>)),
        source.pipe_to(down_tx),
        collect_lines(down_rx),
    );

    assert_eq!(sent, 200);
    assert_eq!(piped.unwrap(), 200);
    assert_eq!(done.unwrap().records, 200);
    assert_eq!(lines, expected_cycle(200));
}

#[tokio::test]
async fn test_direct_writes_with_full_input_queue() {
    let (sink, source) = open(sample_config().with_high_water_mark(4)).unwrap();

    let produce = async move {
        let mut pauses = 0;
        for record in repeated_records(40) {
            match sink.write(record) {
                Ok(WriteStatus::Ready) => {}
                Ok(WriteStatus::Pause) => {
                    pauses += 1;
                    sink.ready().await?;
                }
                Err(e) => panic!("write refused after ready(): {e}"),
            }
        }
        sink.close();
        Ok::<_, StreamError>(pauses)
    };

    let mut lines = Vec::new();
    let consume = source.subscribe(|line, ack| {
        lines.push(line);
        ack.ack();
    });

    let (pauses, done) = tokio::join!(produce, consume);
    assert!(pauses.unwrap() > 0, "queue of 4 should have filled up");
    assert_eq!(done.unwrap().records, 200);
    assert_eq!(lines, expected_cycle(200));
}

#[tokio::test]
async fn test_callback_acknowledged_from_another_task() {
    let (sink, source) = open(sample_config()).unwrap();

    let produce = async move {
        for record in repeated_records(4) {
            sink.accept(record).await?;
        }
        sink.close();
        Ok::<_, StreamError>(())
    };

    let (line_tx, line_rx) = std::sync::mpsc::channel();
    let consume = source.subscribe(move |line, ack: Ack| {
        line_tx.send(line).unwrap();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            ack.ack();
        });
    });

    let (produced, done) = tokio::join!(produce, consume);
    produced.unwrap();
    assert_eq!(done.unwrap().lines, 20);
    let lines: Vec<String> = line_rx.try_iter().collect();
    assert_eq!(lines, expected_cycle(20));
}

#[tokio::test]
async fn test_get_output_selects_mode() {
    let (sink, source) = open(sample_config()).unwrap();
    for record in sample_records() {
        sink.write(record).unwrap();
    }
    sink.close();

    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen_cb = seen.clone();
    let output = source.get_output(Some(move |line: String, ack: Ack| {
        seen_cb.lock().unwrap().push(line);
        ack.ack();
    }));
    let Output::Callback(done) = output else {
        panic!("expected callback mode");
    };
    assert_eq!(done.await.unwrap().records, 5);
    assert_eq!(*seen.lock().unwrap(), EXPECTED_LINES);
}

#[tokio::test]
async fn test_every_line_has_one_field_per_column() {
    let (sink, source) = open(sample_config()).unwrap();
    let odd = vec![
        Record::new(),
        Record::new().with("unknown", "x"),
        Record::new().with("someBoolean", "yes").with("id", 2.5),
        Record::new().with("someDate", "garbage").with("someNumber", "12"),
    ];
    for record in odd {
        sink.write(record).unwrap();
    }
    sink.close();

    let lines: Vec<String> = source.into_stream().map(|l| l.unwrap()).collect().await;
    assert_eq!(
        lines,
        vec![";;;;\n", ";;;;\n", "2.5;;;;1\n", ";;;12;\n"]
    );
    for line in &lines {
        let body = line.strip_suffix('\n').unwrap();
        assert!(!body.contains('\n'));
        assert_eq!(body.split(';').count(), 5);
    }
}

#[tokio::test]
async fn test_upstream_error_reaches_output_instead_of_finish() {
    let (sink, source) = open(sample_config()).unwrap();
    let upstream = futures::stream::iter(vec![
        Ok(Record::new().with("id", 1)),
        Err("source exploded"),
        Ok(Record::new().with("id", 2)),
    ]);

    let mut lines = Vec::new();
    let (piped, done) = tokio::join!(
        sink.pipe_from(upstream),
        source.subscribe(|line, ack| {
            lines.push(line);
            ack.ack();
        }),
    );

    let expected = StreamError::Upstream("source exploded".into());
    assert_eq!(piped.unwrap_err(), expected);
    assert_eq!(done.unwrap_err(), expected);
    assert!(lines.len() <= 1);
    assert!(lines.iter().all(|l| l == "1;;;;\n"));
}
