//! Frame synchronization integration tests
//!
//! Drives a display tree through the serializer, hands the batch across the
//! channel and decodes it on the renderer side:
//! - Objects then References passes over a fresh tree
//! - Incremental updates after the first sync
//! - Events flowing back to the player

use kurbo::Point;
use stage_core::{
    Bounds, ColorTransform, DisplayTree, FocusEvent, FocusEventType, FontMetrics, FontSource,
    FontStyle, ImageType, InputEvent, KeyModifiers, Matrix, MouseEvent, MouseEventType, ObjectId,
    TextFormat,
};
use stage_remoting::{
    channel, read_events, Asset, EventSerializer, FrameBatch, FrameUpdate, Message, MessageDecoder,
    Reference, RemotingConfig, RemotingPhase, Serializer,
};

fn sync(serializer: &mut Serializer, tree: &mut DisplayTree) -> FrameBatch {
    let root = tree.root();
    serializer
        .write_display_object(tree, root, RemotingPhase::Objects)
        .unwrap();
    serializer
        .write_display_object(tree, root, RemotingPhase::References)
        .unwrap();
    serializer.take_batch()
}

fn decode(batch: &FrameBatch) -> Vec<Message> {
    MessageDecoder::new(&batch.bytes)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn frames(messages: &[Message]) -> Vec<&FrameUpdate> {
    messages
        .iter()
        .filter_map(|message| match message {
            Message::UpdateFrame(update) => Some(update),
            _ => None,
        })
        .collect()
}

struct Scene {
    tree: DisplayTree,
    shape: ObjectId,
    text: ObjectId,
    font: ObjectId,
}

fn scene() -> Scene {
    let mut tree = DisplayTree::new(550, 400);
    let root = tree.root();
    let font = tree.register_font(
        "Serif",
        FontStyle::Regular,
        FontMetrics {
            ascent: 0.8,
            descent: 0.2,
            leading: 0.0,
        },
        FontSource::Embedded {
            bold: false,
            italic: false,
            data: vec![0, 1, 0, 0],
        },
    );

    let shape = tree.create_shape();
    tree.update_graphics(shape, |g, _| {
        g.begin_fill(0x0033_66ff, 1.0);
        g.draw_rect(0.0, 0.0, 50.0, 25.0);
        g.end_fill();
    })
    .unwrap();
    tree.set_matrix(shape, Matrix::translate((200.0, 0.0))).unwrap();

    let text = tree.create_text();
    tree.update_text(text, |content| {
        content.set_text(
            "Hello",
            TextFormat {
                font: Some("Serif".into()),
                size: Some(10.0),
                ..TextFormat::default()
            },
        );
    })
    .unwrap();

    tree.add_child(root, shape).unwrap();
    tree.add_child(root, text).unwrap();
    Scene {
        tree,
        shape,
        text,
        font,
    }
}

// ============================================================================
// Full sync
// ============================================================================

#[tokio::test]
async fn test_first_sync_over_channel() {
    let Scene {
        mut tree,
        shape,
        text,
        font,
    } = scene();
    let root = tree.root();
    let config = RemotingConfig::default();
    let (tx, mut rx) = channel::<FrameBatch>(&config);

    let mut serializer = Serializer::with_config(&config);
    serializer.write_stage(&tree);
    let registered = tree.resources().fonts().iter().find(|f| f.id == font).cloned().unwrap();
    serializer.write_font(&registered);
    let batch = sync(&mut serializer, &mut tree);
    tx.send(batch).await.unwrap();
    drop(tx);

    let batch = rx.recv().await.unwrap();
    assert!(rx.recv().await.is_none());
    let messages = decode(&batch);

    assert_eq!(
        messages[0],
        Message::UpdateStage {
            bounds: Bounds::new(0, 0, 11000, 8000)
        }
    );
    assert!(matches!(
        messages[1],
        Message::RegisterFont { id, bold: false, italic: false, asset } if id == font && asset == 0
    ));

    let frames = frames(&messages);
    let order: Vec<ObjectId> = frames.iter().map(|f| f.id).collect();
    assert_eq!(order, vec![root, shape, text, root, shape, text]);

    // Objects pass: properties only.
    assert!(frames[..3].iter().all(|f| f.children.is_none() && f.mask.is_none()));
    assert_eq!(
        frames[1].matrix,
        Some(Matrix::translate((200.0, 0.0)))
    );
    assert_eq!(frames[1].color_transform, Some(ColorTransform::IDENTITY));

    // References pass: the tree structure.
    assert_eq!(
        frames[3].children,
        Some(vec![Reference::Object(shape), Reference::Object(text)])
    );
    let graphics_id = tree.node(shape).unwrap().graphics().unwrap().id();
    assert_eq!(frames[4].children, Some(vec![Reference::Asset(graphics_id)]));
    assert_eq!(frames[4].mask, Some(None));

    // Each payload goes out exactly once.
    let graphics: Vec<_> = messages
        .iter()
        .filter(|m| matches!(m, Message::UpdateGraphics { .. }))
        .collect();
    assert_eq!(graphics.len(), 1);
    let Message::UpdateGraphics { id, bounds, asset, .. } = graphics[0] else {
        unreachable!();
    };
    assert_eq!(*id, graphics_id);
    assert_eq!(*bounds, Bounds::new(0, 0, 1000, 500));
    assert!(matches!(batch.assets.get(*asset), Some(Asset::Shape(_))));

    let Some(Message::UpdateTextContent(update)) = messages
        .iter()
        .find(|m| matches!(m, Message::UpdateTextContent(_)))
    else {
        panic!("text content was not sent");
    };
    assert_eq!(update.runs.len(), 1);
    assert_eq!(update.runs[0].end_index, 5);
    assert_eq!(update.runs[0].format.font, Some(font));
    assert_eq!(update.runs[0].format.ascent, 8);
    assert_eq!(update.runs[0].format.descent, 2);
    assert_eq!(
        batch.assets.get(update.asset),
        Some(&Asset::Text {
            text: "Hello".into()
        })
    );

    assert!(tree.dirty_nodes(root).unwrap().is_empty());
}

// ============================================================================
// Incremental sync
// ============================================================================

#[test]
fn test_second_sync_sends_only_changes() {
    let Scene {
        mut tree, shape, ..
    } = scene();
    let mut serializer = Serializer::new();
    sync(&mut serializer, &mut tree);

    tree.set_color_transform(shape, ColorTransform::from_alpha(0.5))
        .unwrap();
    let messages = decode(&sync(&mut serializer, &mut tree));

    // Only the changed node is visited.
    let frames = frames(&messages);
    assert!(frames.iter().all(|f| f.id == shape));
    let update = frames[0];
    assert!(update.matrix.is_none());
    assert!(update.children.is_none());
    let color_transform = update.color_transform.unwrap();
    assert!((color_transform.alpha_multiplier - 0.5).abs() < f32::EPSILON);
    assert!((color_transform.red_multiplier - 1.0).abs() < f32::EPSILON);
    assert!(messages
        .iter()
        .all(|m| !matches!(m, Message::UpdateGraphics { .. })));
}

#[test]
fn test_bitmap_data_reaches_renderer() {
    let mut tree = DisplayTree::new(100, 100);
    let root = tree.root();
    let data = tree.create_bitmap_data(2, 1, ImageType::StraightAlphaRgba, vec![0xff; 8]);
    let bitmap = tree.create_bitmap(Some(data)).unwrap();
    tree.add_child(root, bitmap).unwrap();

    let batch = sync(&mut Serializer::new(), &mut tree);
    let messages = decode(&batch);
    let bitmaps: Vec<_> = messages
        .iter()
        .filter_map(|m| match m {
            Message::UpdateBitmapData {
                id,
                bounds,
                kind,
                asset,
                ..
            } => Some((*id, *bounds, *kind, *asset)),
            _ => None,
        })
        .collect();
    assert_eq!(bitmaps.len(), 1);
    let (id, bounds, kind, asset) = bitmaps[0];
    assert_eq!(id, data);
    assert_eq!(bounds, Bounds::new(0, 0, 40, 20));
    assert_eq!(kind, ImageType::StraightAlphaRgba);
    assert!(matches!(
        batch.assets.get(asset),
        Some(Asset::Pixels { data, .. }) if data.len() == 8
    ));

    let frames = frames(&messages);
    let references = frames
        .iter()
        .find(|f| f.id == bitmap && f.children.is_some())
        .and_then(|f| f.children.clone());
    assert_eq!(references, Some(vec![Reference::Asset(data)]));
}

#[test]
fn test_asset_table_survives_json() {
    let Scene { mut tree, .. } = scene();
    let batch = sync(&mut Serializer::new(), &mut tree);
    let json = batch.assets.to_json().unwrap();
    let restored = stage_remoting::AssetTable::from_json(&json).unwrap();
    assert_eq!(restored, batch.assets);
}

// ============================================================================
// Inbound events
// ============================================================================

#[tokio::test]
async fn test_events_flow_back_to_player() {
    let (tx, mut rx) = channel::<Vec<u8>>(&RemotingConfig::default());
    let events = vec![
        InputEvent::Mouse(MouseEvent {
            kind: MouseEventType::Click,
            point: Point::new(210.0, 10.0),
            buttons: 1,
            modifiers: KeyModifiers::default(),
        }),
        InputEvent::Focus(FocusEvent {
            kind: FocusEventType::WindowBlur,
        }),
    ];

    let mut writer = EventSerializer::new();
    for event in &events {
        writer.write_event(event);
    }
    tx.send(writer.take()).await.unwrap();

    let bytes = rx.recv().await.unwrap();
    assert_eq!(read_events(&bytes).unwrap(), events);
}
