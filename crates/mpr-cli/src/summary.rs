use std::collections::BTreeMap;

use console::Style;
use mpr_core::geometry::Vec3;
use mpr_core::layout::LayoutKind;
use mpr_core::preservation::restoration_priority;
use mpr_core::render::MemoryBackend;
use mpr_core::viewport::Orientation;
use mpr_core::{Viewer, ViewerEvent, VisualState};

use crate::commands::refline::PlanePair;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

pub fn print_layout_catalog(kinds: &[LayoutKind], priorities: bool) {
    let s = Styles::new();
    print_title(&s, "Layout Catalog");

    for kind in kinds {
        let layout = kind.layout();
        let names: Vec<&str> = layout.viewports.iter().map(|n| n.as_str()).collect();
        println!(
            "  {:<14}{}  {}",
            s.header.apply_to(kind.as_str()),
            s.value.apply_to(format!("{} x {}", layout.cols, layout.rows)),
            s.method.apply_to(names.join(", "))
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Focus"),
            s.value.apply_to(kind.default_focus())
        );
        if kind.has_mpr_panes() {
            let planes: Vec<String> = kind.orientations().map(|o| o.to_string()).collect();
            println!(
                "    {:<12}{}",
                s.label.apply_to("MPR"),
                s.method.apply_to(planes.join(", "))
            );
        } else {
            println!(
                "    {:<12}{}",
                s.label.apply_to("MPR"),
                s.disabled.apply_to("none")
            );
        }
        if priorities {
            for (destination, sources) in restoration_priority(*kind) {
                let sources: Vec<&str> = sources.iter().map(|n| n.as_str()).collect();
                println!(
                    "    {:<12}{}",
                    s.label.apply_to(destination.as_str()),
                    s.value.apply_to(sources.join(" > "))
                );
            }
        }
        println!();
    }
}

fn describe_visual(state: &VisualState) -> String {
    let mut text = format!("x{:.2} {:.0}\u{b0}", state.scale, state.rotation);
    if state.hflip {
        text.push_str(" hflip");
    }
    if state.vflip {
        text.push_str(" vflip");
    }
    if state.invert {
        text.push_str(" invert");
    }
    text
}

fn event_kind(event: &ViewerEvent) -> &'static str {
    match event {
        ViewerEvent::ViewportCreated { .. } => "created",
        ViewerEvent::LayoutChanged { .. } => "layout",
        ViewerEvent::ActiveViewportChanged { .. } => "focus",
        ViewerEvent::ViewportInert { .. } => "inert",
    }
}

pub fn print_viewer_summary(
    viewer: &Viewer<MemoryBackend>,
    events: &[ViewerEvent],
    failures: &[String],
) {
    let s = Styles::new();
    let stats = viewer.stats();
    print_title(&s, "Viewer State");

    match stats.layout {
        Some(layout) => println!(
            "  {:<14}{}",
            s.label.apply_to("Layout"),
            s.method.apply_to(layout)
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Layout"),
            s.disabled.apply_to("none")
        ),
    }
    match stats.active {
        Some(name) => println!(
            "  {:<14}{}",
            s.label.apply_to("Focus"),
            s.value.apply_to(name)
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Focus"),
            s.disabled.apply_to("none")
        ),
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Clock"),
        s.value.apply_to(format!("{} ms", viewer.now().as_millis()))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Ref. lines"),
        if viewer.reference_lines_enabled() {
            s.method.apply_to("enabled")
        } else {
            s.disabled.apply_to("disabled")
        }
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Viewports"),
        s.value.apply_to(format!(
            "{} enabled, {} with images, {} inert",
            stats.enabled, stats.with_images, stats.inert
        ))
    );
    println!();

    if let Some(layout) = stats.layout {
        println!("  {}", s.header.apply_to("Panes"));
        for name in layout.viewports() {
            if viewer.registry().is_inert(*name) {
                println!(
                    "    {:<12}{}",
                    s.label.apply_to(name.as_str()),
                    s.disabled.apply_to("inert")
                );
                continue;
            }
            let Some(surface) = viewer
                .get_viewport(*name)
                .and_then(|id| viewer.backend().surface(id))
            else {
                println!(
                    "    {:<12}{}",
                    s.label.apply_to(name.as_str()),
                    s.disabled.apply_to("pending")
                );
                continue;
            };
            let marker = if stats.active == Some(*name) { "*" } else { " " };
            match surface.image {
                Some(ref image) => println!(
                    "    {:<12}{}{}  {}  {}",
                    s.label.apply_to(name.as_str()),
                    marker,
                    s.value.apply_to(&image.image_id),
                    s.method.apply_to(describe_visual(&surface.visual)),
                    s.label.apply_to(format!("{} lines", surface.lines.len()))
                ),
                None => println!(
                    "    {:<12}{}{}",
                    s.label.apply_to(name.as_str()),
                    marker,
                    s.disabled.apply_to("empty")
                ),
            }
        }
        println!();

        if layout.has_mpr_panes() {
            println!("  {}", s.header.apply_to("Slices"));
            for orientation in Orientation::ALL {
                println!(
                    "    {:<12}{}",
                    s.label.apply_to(orientation),
                    s.value.apply_to(format!("{:.3}", viewer.slice_position(orientation)))
                );
            }
            println!();
        }
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event_kind(event)).or_default() += 1;
    }
    println!("  {}", s.header.apply_to("Events"));
    if counts.is_empty() {
        println!("    {}", s.disabled.apply_to("none"));
    }
    for (kind, count) in counts {
        println!(
            "    {:<12}{}",
            s.label.apply_to(kind),
            s.value.apply_to(count)
        );
    }
    println!();

    let backend = viewer.backend();
    println!("  {}", s.header.apply_to("Surfaces"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Created"),
        s.value.apply_to(backend.created_count())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Destroyed"),
        s.value.apply_to(backend.destroyed_count())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Live"),
        s.value.apply_to(backend.live_surface_count())
    );
    println!();

    if !failures.is_empty() {
        println!("  {}", s.header.apply_to("Failures"));
        for (i, failure) in failures.iter().enumerate() {
            println!(
                "    {}. {}",
                s.label.apply_to(i + 1),
                s.disabled.apply_to(failure)
            );
        }
        println!();
    }
}

fn format_point(p: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
}

pub fn print_reference_line(pair: &PlanePair, endpoints: Option<(Vec3, Vec3)>) {
    let s = Styles::new();
    print_title(&s, "Reference Line");

    println!(
        "  {:<14}{}",
        s.label.apply_to("Source normal"),
        s.value.apply_to(format_point(pair.source.normal()))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Target"),
        s.value.apply_to(format!("{} x {}", pair.columns, pair.rows))
    );
    println!();

    let Some((start, end)) = endpoints else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Line"),
            s.disabled.apply_to("planes do not cross within the image")
        );
        println!();
        return;
    };

    println!("  {}", s.header.apply_to("Patient"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Start"),
        s.value.apply_to(format_point(start))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("End"),
        s.value.apply_to(format_point(end))
    );
    println!();

    let a = pair.target.pixel_point(start);
    let b = pair.target.pixel_point(end);
    println!("  {}", s.header.apply_to("Pixels"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Start"),
        s.method.apply_to(format!("({:.1}, {:.1})", a.x, a.y))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("End"),
        s.method.apply_to(format!("({:.1}, {:.1})", b.x, b.y))
    );
    println!();
}
