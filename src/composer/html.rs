//! Self-contained HTML rendering of the daily report.
//!
//! One document, styles in a single `<style>` block, no external assets.
//! Every dynamic string goes through [`esc`]; every optional field renders a
//! literal placeholder instead.

use crate::models::{ExtractedEvent, ExtractedNews, Holiday, NA, SportEvent};
use html_escape::encode_text;
use std::fmt::Write;

/// Everything the renderer needs, already extracted and capped.
#[derive(Debug)]
pub struct ReportView<'a> {
    /// `dd/mm/YYYY`
    pub date: String,
    /// `dd/mm/YYYY às HH:MM:SS`
    pub generated_at: String,
    pub total_collected: usize,
    pub news: &'a [ExtractedNews],
    pub events: &'a [ExtractedEvent],
    pub results: Vec<&'a SportEvent>,
    pub esports: Vec<&'a SportEvent>,
    pub holidays: Vec<&'a Holiday>,
    pub market: &'a [String],
    pub strategy: &'a [String],
}

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #1a1a1a; color: #ffffff; line-height: 1.6; }
.container { max-width: 800px; margin: 0 auto; background: #000000; }
.header { background: linear-gradient(135deg, #d4af37 0%, #f4d03f 100%); color: #000000; padding: 30px; text-align: center; }
.header h1 { font-size: 2.2em; margin-bottom: 10px; }
.stats-bar { background: #1f1f1f; padding: 20px; display: flex; justify-content: space-around; border-bottom: 3px solid #d4af37; }
.stat { text-align: center; padding: 10px; }
.stat-number { font-size: 2em; font-weight: bold; color: #d4af37; display: block; }
.stat-label { font-size: 0.9em; color: #cccccc; text-transform: uppercase; letter-spacing: 1px; }
.section { padding: 30px; border-bottom: 1px solid #333333; }
.section-title { font-size: 1.6em; color: #d4af37; margin-bottom: 20px; }
.badge { background: #d4af37; color: #000000; padding: 4px 12px; border-radius: 20px; font-size: 0.7em; font-weight: bold; text-transform: uppercase; }
.news-item { background: #242424; border-radius: 12px; padding: 20px; margin-bottom: 16px; border-left: 4px solid #d4af37; }
.news-title { font-size: 1.2em; font-weight: bold; margin-bottom: 10px; }
.news-description { color: #cccccc; margin-bottom: 15px; }
.news-meta { display: flex; justify-content: space-between; font-size: 0.9em; }
.news-source { color: #d4af37; }
.event-card { background: #242424; border-radius: 12px; padding: 20px; margin-bottom: 16px; text-align: center; border: 2px solid #333333; }
.match { font-size: 1.3em; font-weight: bold; margin-bottom: 10px; }
.vs { color: #d4af37; margin: 0 10px; }
.event-details { color: #cccccc; font-size: 0.9em; }
.result-row, .esports-row, .holiday-row { padding: 8px 0; border-bottom: 1px solid #2a2a2a; }
.score { color: #d4af37; font-weight: bold; margin: 0 8px; }
.ai-analysis { background: #16213e; border-radius: 12px; padding: 25px; border: 2px solid #d4af37; }
.ai-title { color: #d4af37; font-size: 1.3em; font-weight: bold; margin-bottom: 15px; }
.market-bullet { margin-bottom: 12px; padding-left: 20px; }
.empty { color: #888888; font-style: italic; }
.footer { background: #d4af37; color: #000000; padding: 30px; text-align: center; }
.footer h3 { margin-bottom: 10px; }
"#;

/// Escape text for an HTML text node.
fn esc(s: &str) -> String {
    encode_text(s).into_owned()
}

fn opt<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(placeholder)
}

fn empty_notice(out: &mut String, text: &str) {
    let _ = writeln!(out, r#"<p class="empty">{}</p>"#, esc(text));
}

fn render_header(out: &mut String, view: &ReportView<'_>) {
    let _ = write!(
        out,
        r#"<div class="header">
<h1>🚨 FAROL DE NOTÍCIAS</h1>
<div class="subtitle">Artplan - BetMGM • {}<br>Curadoria por IA</div>
</div>
<div class="stats-bar">
<div class="stat"><span class="stat-number">{}</span><span class="stat-label">Notícias Curadas</span></div>
<div class="stat"><span class="stat-number">{}</span><span class="stat-label">Eventos Hoje/Amanhã</span></div>
<div class="stat"><span class="stat-number">{}</span><span class="stat-label">Dados Coletados</span></div>
</div>
"#,
        esc(&view.date),
        view.news.len(),
        view.events.len(),
        view.total_collected,
    );
}

fn render_news(out: &mut String, news: &[ExtractedNews]) {
    let _ = writeln!(
        out,
        r#"<div class="section"><h2 class="section-title">📰 Top {} Notícias Curadas <span class="badge">IA</span></h2>"#,
        news.len()
    );
    if news.is_empty() {
        empty_notice(out, "Nenhuma notícia disponível hoje.");
    }
    for (i, n) in news.iter().enumerate() {
        let _ = write!(
            out,
            r#"<div class="news-item">
<div class="news-title">{}. {}</div>
<div class="news-description">{}</div>
<div class="news-meta"><span class="news-source">📡 {} • {}</span><span class="badge" style="background: {};">{}</span></div>
</div>
"#,
            i + 1,
            esc(n.title()),
            esc(n.description()),
            esc(n.source()),
            esc(n.category()),
            n.relevance.color(),
            n.relevance.label(),
        );
    }
    out.push_str("</div>\n");
}

fn render_events(out: &mut String, events: &[ExtractedEvent]) {
    let _ = writeln!(
        out,
        r#"<div class="section"><h2 class="section-title">⚽ Top {} Eventos Selecionados <span class="badge">IA</span></h2>"#,
        events.len()
    );
    if events.is_empty() {
        empty_notice(out, "Nenhum evento selecionado.");
    }
    for e in events {
        let _ = write!(
            out,
            r#"<div class="event-card">
<div class="match">{}<span class="vs">VS</span>{}</div>
<div class="event-details">🏆 {}<br>📅 {} • ⏰ {}<br>🎯 {} • <span style="color: {};">{}</span></div>
</div>
"#,
            esc(e.home_team()),
            esc(e.away_team()),
            esc(e.league()),
            esc(e.date()),
            esc(e.time()),
            esc(e.sport()),
            e.relevance.color(),
            e.relevance.label(),
        );
    }
    out.push_str("</div>\n");
}

fn render_results(out: &mut String, results: &[&SportEvent]) {
    out.push_str(r#"<div class="section"><h2 class="section-title">📊 Resultados Recentes</h2>"#);
    out.push('\n');
    if results.is_empty() {
        empty_notice(out, "Sem resultados recentes.");
    }
    for r in results {
        let _ = writeln!(
            out,
            r#"<div class="result-row">{}<span class="score">{}</span>{} <small>({} • {})</small></div>"#,
            esc(opt(Some(r.home_team.as_str()), NA)),
            esc(opt(r.score.as_deref(), "x")),
            esc(opt(Some(r.away_team.as_str()), NA)),
            esc(opt(Some(r.league.as_str()), NA)),
            esc(opt(Some(r.date.as_str()), NA)),
        );
    }
    out.push_str("</div>\n");
}

fn render_esports(out: &mut String, esports: &[&SportEvent]) {
    out.push_str(r#"<div class="section"><h2 class="section-title">🎮 E-sports</h2>"#);
    out.push('\n');
    if esports.is_empty() {
        empty_notice(out, "Sem partidas de e-sports programadas.");
    }
    for e in esports {
        let _ = writeln!(
            out,
            r#"<div class="esports-row">⏰ {} • {} <span class="vs">VS</span> {} <small>({} • {} • {})</small></div>"#,
            esc(opt(Some(e.time.as_str()), "Horário a definir")),
            esc(opt(Some(e.home_team.as_str()), "Time A")),
            esc(opt(Some(e.away_team.as_str()), "Time B")),
            esc(opt(Some(e.league.as_str()), "Liga não informada")),
            esc(opt(e.game.as_deref(), NA)),
            esc(opt(e.viewers.as_deref(), NA)),
        );
    }
    out.push_str("</div>\n");
}

fn render_holidays(out: &mut String, holidays: &[&Holiday]) {
    out.push_str(r#"<div class="section"><h2 class="section-title">📅 Datas Especiais</h2>"#);
    out.push('\n');
    if holidays.is_empty() {
        empty_notice(out, "Nenhuma data especial nos próximos 30 dias.");
    }
    for h in holidays {
        let _ = writeln!(
            out,
            r#"<div class="holiday-row">{} • <strong>{}</strong> • em {} dias • {}</div>"#,
            esc(opt(Some(h.date.as_str()), NA)),
            esc(opt(Some(h.name.as_str()), NA)),
            h.days_until,
            esc(opt(Some(h.impact.as_str()), NA)),
        );
    }
    out.push_str("</div>\n");
}

fn render_bullets(out: &mut String, title: &str, bullets: &[String]) {
    let _ = write!(
        out,
        r#"<div class="section"><div class="ai-analysis"><div class="ai-title">{}</div><div class="ai-content">
"#,
        esc(title)
    );
    for b in bullets {
        let _ = writeln!(out, r#"<div class="market-bullet">• {}</div>"#, esc(b));
    }
    out.push_str("</div></div></div>\n");
}

fn render_footer(out: &mut String, view: &ReportView<'_>) {
    let _ = write!(
        out,
        r#"<div class="footer">
<h3>📊 Artplan - Business Intelligence</h3>
<p><strong>Relatório gerado em:</strong> {}</p>
<p><strong>Próximo relatório:</strong> Amanhã às 09:30</p>
</div>
"#,
        esc(&view.generated_at)
    );
}

/// Render the whole report document.
pub fn render_html(view: &ReportView<'_>) -> String {
    let mut out = String::with_capacity(16 * 1024);
    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Farol de Notícias - Artplan - BetMGM - {}</title>
<style>{}</style>
</head>
<body>
<div class="container">
"#,
        esc(&view.date),
        STYLE
    );
    render_header(&mut out, view);
    render_news(&mut out, view.news);
    render_events(&mut out, view.events);
    render_results(&mut out, &view.results);
    render_esports(&mut out, &view.esports);
    render_holidays(&mut out, &view.holidays);
    render_bullets(&mut out, "🧠 Análise de Impacto no Mercado", view.market);
    render_bullets(&mut out, "🎯 Estratégia BetMGM do Dia", view.strategy);
    render_footer(&mut out, view);
    out.push_str("</div>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Relevance;

    fn view<'a>(
        news: &'a [ExtractedNews],
        events: &'a [ExtractedEvent],
        bullets: &'a [String],
    ) -> ReportView<'a> {
        ReportView {
            date: "06/05/2025".to_string(),
            generated_at: "06/05/2025 às 09:30:00".to_string(),
            total_collected: 42,
            news,
            events,
            results: Vec::new(),
            esports: Vec::new(),
            holidays: Vec::new(),
            market: bullets,
            strategy: bullets,
        }
    }

    #[test]
    fn test_dynamic_text_is_escaped() {
        let news = vec![ExtractedNews {
            title: Some("<script>alert(1)</script> & cia".to_string()),
            description: None,
            source: None,
            category: None,
            relevance: Relevance::High,
        }];
        let html = render_html(&view(&news, &[], &[]));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; cia"));
        assert!(html.contains("#ff6b6b"));
    }

    #[test]
    fn test_missing_fields_render_placeholders() {
        let news = vec![ExtractedNews {
            title: None,
            description: None,
            source: None,
            category: None,
            relevance: Relevance::Low,
        }];
        let events = vec![ExtractedEvent {
            home_team: None,
            away_team: None,
            league: None,
            date: None,
            time: None,
            sport: None,
            relevance: Relevance::Medium,
        }];
        let html = render_html(&view(&news, &events, &[]));
        for placeholder in [
            "Título não disponível",
            "Descrição não disponível",
            "Fonte IA",
            "Time A",
            "Time B",
            "Liga não informada",
            "Data a definir",
            "Horário a definir",
            "Sem resultados recentes.",
            "Nenhuma data especial",
        ] {
            assert!(html.contains(placeholder), "missing {placeholder}");
        }
        assert!(html.contains("Baixa"));
    }

    #[test]
    fn test_document_is_self_contained() {
        let bullets = vec!["Flamengo lidera as menções".to_string()];
        let html = render_html(&view(&[], &[], &bullets));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(!html.contains("<link"));
        assert!(!html.contains("src=\"http"));
        assert_eq!(html.matches("Flamengo lidera as menções").count(), 2);
        assert!(html.contains("Nenhuma notícia disponível hoje."));
    }
}
