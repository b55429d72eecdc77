//! Deterministic fallback data for every collection category.
//!
//! The collector consults a [`FixtureProvider`] whenever a live source fails
//! or comes back short. [`StaticFixtures`] serves fixed tables of Brazilian
//! fixtures, results, e-sports matches and news, dated relative to the run.

use super::{market_news, trending_topics};
use crate::models::{Category, Holiday, NewsItem, RawItem, SportEvent};
use crate::scrapers::rss::rank_news;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};

/// Source of fallback items. Implementations should not return an empty
/// list; the collector logs it and writes an empty, unsuccessful snapshot.
pub trait FixtureProvider {
    fn fixtures(&self, category: Category, now: DateTime<FixedOffset>) -> Vec<RawItem>;
}

/// Built-in tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFixtures;

const TODAY_GAMES: [(&str, &str, &str); 5] = [
    ("Flamengo", "Botafogo", "16:00"),
    ("Palmeiras", "São Paulo", "18:30"),
    ("Corinthians", "Santos", "19:00"),
    ("Atlético-MG", "Cruzeiro", "20:00"),
    ("Grêmio", "Internacional", "21:30"),
];

const TOMORROW_GAMES: [(&str, &str, &str); 5] = [
    ("Palmeiras", "Fluminense", "16:00"),
    ("Santos", "Botafogo", "18:30"),
    ("Atlético-MG", "Fortaleza", "19:00"),
    ("Bahia", "Coritiba", "20:00"),
    ("Vasco", "Grêmio", "21:30"),
];

const RESULTS: [(&str, &str, &str); 5] = [
    ("Flamengo", "Palmeiras", "2-1"),
    ("Corinthians", "São Paulo", "1-0"),
    ("Grêmio", "Internacional", "3-2"),
    ("Botafogo", "Vasco", "1-1"),
    ("Santos", "Atlético-MG", "0-2"),
];

const WEEKLY_GAMES: [(&str, &str); 7] = [
    ("Vasco", "Fluminense"),
    ("Bahia", "Vitória"),
    ("Fortaleza", "Ceará"),
    ("Athletico-PR", "Coritiba"),
    ("Bragantino", "Guarani"),
    ("Cruzeiro", "Flamengo"),
    ("São Paulo", "Corinthians"),
];

/// (home, away, league, game, time, viewers)
const ESPORTS: [(&str, &str, &str, &str, &str, &str); 5] = [
    ("LOUD", "paiN Gaming", "CBLOL 2024", "League of Legends", "20:00", "15K espectadores esperados"),
    ("FURIA", "Fluxo", "CBLOL 2024", "League of Legends", "21:00", "30K espectadores esperados"),
    ("KaBuM", "Red Canids", "CBLOL 2024", "League of Legends", "22:00", "45K espectadores esperados"),
    ("LOUD", "FURIA", "VCT Brazil 2024", "Valorant", "18:30", "20K espectadores esperados"),
    ("MIBR", "00 Nation", "VCT Brazil 2024", "Valorant", "19:30", "40K espectadores esperados"),
];

/// (source, category, title, description, link)
const NEWS: [(&str, &str, &str, &str, &str); 20] = [
    ("GloboEsporte", "Futebol Brasileiro",
     "Flamengo anuncia renovação de contrato com Gabigol até 2025",
     "Atacante assina novo vínculo com o Rubro-Negro carioca por mais dois anos",
     "https://ge.globo.com/futebol/times/flamengo/"),
    ("GloboEsporte", "Futebol Brasileiro",
     "Palmeiras x São Paulo: onde assistir, escalações e arbitragem do Choque-Rei",
     "Clássico paulista acontece neste domingo pelo Brasileirão",
     "https://ge.globo.com/futebol/brasileirao-serie-a/"),
    ("GloboEsporte", "Futebol Brasileiro",
     "Corinthians acerta contratação de meio-campista argentino",
     "Novo reforço chega para disputar posição no meio de campo",
     "https://ge.globo.com/futebol/times/corinthians/"),
    ("GloboEsporte", "Futebol Brasileiro",
     "Vasco vence Atlético-MG e se aproxima do G4 do Brasileirão",
     "Cruzmaltino fez 2 a 1 no Mineirão e sobe na tabela",
     "https://ge.globo.com/futebol/times/vasco/"),
    ("GloboEsporte", "Futebol Brasileiro",
     "CBF define datas das próximas rodadas do Campeonato Brasileiro",
     "Confederação divulga calendário das próximas semanas da competição",
     "https://ge.globo.com/futebol/"),
    ("ESPN Brasil", "Esportes",
     "Copa América: Brasil estreia contra Costa Rica na próxima semana",
     "Seleção Brasileira faz último treino antes da estreia na competição",
     "https://www.espn.com.br/futebol/copa-america/"),
    ("ESPN Brasil", "Esportes",
     "Real Madrid oficializa contratação de Endrick; brasileiro assina até 2030",
     "Jovem atacante se torna o brasileiro mais jovem a assinar com os Merengues",
     "https://www.espn.com.br/futebol/transferencias/"),
    ("ESPN Brasil", "Esportes",
     "CBLOL: LOUD garante vaga nas finais e enfrentará paiN Gaming",
     "Equipe venceu na semifinal e disputa o título do split",
     "https://www.espn.com.br/esports/"),
    ("ESPN Brasil", "Esportes",
     "Libertadores: Fluminense e Grêmio avançam às oitavas de final",
     "Times brasileiros confirmam classificação na fase de grupos",
     "https://www.espn.com.br/futebol/libertadores/"),
    ("Lance!", "Futebol",
     "Botafogo anuncia chegada de técnico português para comandar equipe",
     "Novo comandante chega com contrato de dois anos",
     "https://www.lance.com.br/botafogo/"),
    ("Lance!", "Futebol",
     "Santos negocia contratação de atacante uruguaio para a Série B",
     "Peixe busca reforços para retornar à elite do futebol brasileiro",
     "https://www.lance.com.br/santos/"),
    ("Lance!", "Futebol",
     "Brasileirão: tabela atualizada após rodada do fim de semana",
     "Veja como ficou a classificação após os jogos do domingo",
     "https://www.lance.com.br/brasileirao/"),
    ("UOL Esporte", "Futebol",
     "Copa do Mundo de 2026: FIFA define sedes dos jogos da seleção brasileira",
     "Confederação divulga calendário preliminar da competição",
     "https://www.uol.com.br/esporte/futebol/copa-do-mundo/"),
    ("UOL Esporte", "Futebol",
     "Mercado da bola: principais transferências do meio do ano no futebol brasileiro",
     "Janela de transferências movimenta clubes da Série A",
     "https://www.uol.com.br/esporte/futebol/mercado/"),
    ("Mais Esports", "E-sports",
     "LOUD confirma roster para Valorant Champions Tour 2024",
     "Equipe brasileira mantém core principal para temporada",
     "https://maisesports.com.br/valorant/"),
    ("Mais Esports", "E-sports",
     "CBLOL: paiN Gaming x FURIA é destaque da rodada de playoffs",
     "Confronto decide uma das vagas para a final do campeonato",
     "https://maisesports.com.br/cblol/"),
    ("Mais Esports", "E-sports",
     "Free Fire: Brasil garante duas vagas no Mundial de Esports 2024",
     "Representantes nacionais se classificam em torneio classificatório",
     "https://maisesports.com.br/free-fire/"),
    ("Mais Esports", "E-sports",
     "CS2: Imperial anuncia mudanças no roster para próxima temporada",
     "Time brasileiro busca renovação para competições internacionais",
     "https://maisesports.com.br/cs2/"),
    ("Transfermarkt Brasil", "Mercado da Bola",
     "Mercado: Flamengo negocia contratação de lateral-esquerdo argentino",
     "Rubro-Negro avança nas negociações por reforço para lateral",
     "https://www.transfermarkt.com.br/"),
    ("Transfermarkt Brasil", "Mercado da Bola",
     "Palmeiras renova contratos de três jogadores da base até 2027",
     "Verdão garante permanência de promessas das categorias de base",
     "https://www.transfermarkt.com.br/palmeiras/"),
];

fn dmy(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn football(home: &str, away: &str, date: NaiveDate, time: &str) -> SportEvent {
    SportEvent {
        home_team: home.to_string(),
        away_team: away.to_string(),
        league: "Brasileirão Série A".to_string(),
        date: dmy(date),
        time: time.to_string(),
        sport: "Futebol".to_string(),
        venue: Some(format!("Estádio do {home}")),
        status: Some("Agendado".to_string()),
        score: None,
        game: None,
        viewers: None,
        tv: None,
    }
}

fn today_events(today: NaiveDate) -> Vec<RawItem> {
    TODAY_GAMES
        .iter()
        .map(|(h, a, t)| RawItem::Event(football(h, a, today, t)))
        .collect()
}

fn tomorrow_events(today: NaiveDate) -> Vec<RawItem> {
    let tomorrow = today + Duration::days(1);
    TOMORROW_GAMES
        .iter()
        .map(|(h, a, t)| {
            let mut e = football(h, a, tomorrow, t);
            e.tv = Some("SporTV, Premiere".to_string());
            RawItem::Event(e)
        })
        .collect()
}

fn recent_results(today: NaiveDate) -> Vec<RawItem> {
    let yesterday = today - Duration::days(1);
    RESULTS
        .iter()
        .map(|(h, a, score)| {
            let mut e = football(h, a, yesterday, "16:00");
            e.status = Some("Finalizado".to_string());
            e.score = Some(score.to_string());
            RawItem::Event(e)
        })
        .collect()
}

fn esports(today: NaiveDate) -> Vec<RawItem> {
    ESPORTS
        .iter()
        .map(|(h, a, league, game, time, viewers)| {
            RawItem::Event(SportEvent {
                home_team: h.to_string(),
                away_team: a.to_string(),
                league: league.to_string(),
                date: dmy(today),
                time: time.to_string(),
                sport: "E-Sports".to_string(),
                venue: Some(if *game == "Valorant" { "Online" } else { "Studio Riot Games" }.to_string()),
                status: Some("Agendado".to_string()),
                score: None,
                game: Some(game.to_string()),
                viewers: Some(viewers.to_string()),
                tv: None,
            })
        })
        .collect()
}

fn weekly(today: NaiveDate) -> Vec<RawItem> {
    WEEKLY_GAMES
        .iter()
        .enumerate()
        .map(|(offset, (h, a))| {
            RawItem::Event(football(h, a, today + Duration::days(offset as i64), "16:00"))
        })
        .collect()
}

/// The fixture news table, ranked the same way live news is.
pub fn fixture_news(now: DateTime<FixedOffset>) -> Vec<NewsItem> {
    let stamp = now.format("%d/%m/%Y %H:%M").to_string();
    let items = NEWS
        .iter()
        .map(|(source, category, title, description, link)| NewsItem {
            title: title.to_string(),
            description: description.to_string(),
            source: source.to_string(),
            link: link.to_string(),
            category: category.to_string(),
            date: Some(stamp.clone()),
            collected_at: None,
            collection_source: None,
        })
        .collect();
    rank_news(items)
}

/// Next Christmas, the one date that is always within reach of a campaign.
fn christmas(today: NaiveDate) -> Vec<RawItem> {
    let this_year = NaiveDate::from_ymd_opt(today.year(), 12, 25);
    let next = match this_year {
        Some(d) if d >= today => d,
        _ => NaiveDate::from_ymd_opt(today.year() + 1, 12, 25).unwrap_or(today),
    };
    vec![RawItem::Holiday(Holiday {
        date: next.format("%d/%m").to_string(),
        name: "Natal".to_string(),
        days_until: (next - today).num_days(),
        impact: "Campanhas familiares e promoções especiais".to_string(),
    })]
}

impl FixtureProvider for StaticFixtures {
    fn fixtures(&self, category: Category, now: DateTime<FixedOffset>) -> Vec<RawItem> {
        let today = now.date_naive();
        match category {
            Category::EventsToday => today_events(today),
            Category::EventsTomorrow => tomorrow_events(today),
            Category::Next24h => {
                let mut all = today_events(today);
                all.extend(tomorrow_events(today));
                all
            }
            Category::RecentResults => recent_results(today),
            Category::Esports => esports(today),
            Category::WeeklySchedule => weekly(today),
            Category::News => fixture_news(now).into_iter().map(RawItem::News).collect(),
            Category::Market => market_news(&fixture_news(now)),
            Category::Trending => trending_topics(&fixture_news(now)),
            Category::Holidays => christmas(today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        crate::utils::sao_paulo_offset()
            .with_ymd_and_hms(2024, 6, 9, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_every_category_has_fixtures() {
        for category in Category::ALL {
            assert!(
                !StaticFixtures.fixtures(category, now()).is_empty(),
                "{category} fixtures are empty"
            );
        }
    }

    #[test]
    fn test_fixtures_are_dated_from_now() {
        let tomorrow = StaticFixtures.fixtures(Category::EventsTomorrow, now());
        assert_eq!(tomorrow[0].as_event().unwrap().date, "10/06/2024");
        let results = StaticFixtures.fixtures(Category::RecentResults, now());
        let first = results[0].as_event().unwrap();
        assert_eq!(first.date, "08/06/2024");
        assert_eq!(first.score.as_deref(), Some("2-1"));
    }

    #[test]
    fn test_next24h_is_today_then_tomorrow() {
        let all = StaticFixtures.fixtures(Category::Next24h, now());
        assert_eq!(all.len(), TODAY_GAMES.len() + TOMORROW_GAMES.len());
        assert_eq!(all[0].as_event().unwrap().date, "09/06/2024");
        assert_eq!(all[9].as_event().unwrap().date, "10/06/2024");
    }

    #[test]
    fn test_news_fixtures_are_capped_and_prioritised() {
        let news = fixture_news(now());
        assert_eq!(news.len(), crate::scrapers::rss::MAX_NEWS);
        assert_eq!(news[0].source, "ESPN Brasil");
    }

    #[test]
    fn test_christmas_rolls_over() {
        let late = NaiveDate::from_ymd_opt(2024, 12, 26).unwrap();
        let h = christmas(late);
        let h = h[0].as_holiday().unwrap();
        assert_eq!(h.days_until, 364);
        assert_eq!(h.date, "25/12");
    }
}
