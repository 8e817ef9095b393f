//! Scene events example
//!
//! Shows how insights follow edits, and how collapsed ones are announced and removed.

use insight_core::{Insight, InsightAction, ParagraphLayout, SceneDocument, SceneOptions};

fn main() {
    println!("=== Insight scene example ===\n");

    let mut scene = SceneDocument::new("Teh quick fox\njumps over the dog", SceneOptions::default());

    scene.subscribe(|change| {
        println!(
            "  scene change: {:?} (version {} -> {})",
            change.change_type, change.old_version, change.new_version
        );
    });
    scene.subscribe_index(|event| println!("  index event: {event:?}"));

    println!("1. Adding insights:");
    let len = scene.document().len_chars();
    if let Ok(insight) = Insight::spelling(0, 3, len, "Unknown word", vec!["The".into()]) {
        scene.add_insight(insight);
    }
    if let Err(err) = scene.add_note(14, 19, "stronger verb?") {
        println!("  failed to add note: {err}");
    }
    print_insights(&scene);

    println!("\n2. Typing before the note shifts it:");
    if let Err(err) = scene.insert_text(14, "  ") {
        println!("  edit failed: {err}");
    }
    print_insights(&scene);

    println!("\n3. Applying the spelling suggestion removes the insight:");
    if let Err(err) = scene.trigger(0, InsightAction::Replace("The".into())) {
        println!("  action failed: {err}");
    }
    print_insights(&scene);

    println!("\n4. Formats per paragraph:");
    for paragraph in 0..scene.document().paragraph_count() {
        println!("  paragraph {paragraph}: {:?}", scene.document().formats(paragraph));
    }
}

fn print_insights(scene: &SceneDocument) {
    for (id, insight) in scene.index().iter_with_ids() {
        println!(
            "  {id} {:?} {:?} {:?}",
            insight.kind(),
            insight.range(),
            insight.message()
        );
    }
}
